fn main() {
    std::process::exit(mirakle::run());
}
