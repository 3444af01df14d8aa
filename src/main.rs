fn main() {
    mediasweep_lib::run()
}
