use pkmeans::app;

fn main() {
    app::main();
}
