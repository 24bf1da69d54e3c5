fn main() {
    pcal_spectrum::cli::run();
}
