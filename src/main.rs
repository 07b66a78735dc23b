fn main() {
    dslkit::cli::run();
}
