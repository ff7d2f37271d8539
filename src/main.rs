fn main() {
    env_logger::init();
    tinybasic::term::main();
}
