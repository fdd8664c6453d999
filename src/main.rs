fn main() {
    gangway::run();
}
