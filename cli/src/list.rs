use comfy_table::{presets::UTF8_BORDERS_ONLY, Cell, Color, Table};
use itertools::Itertools;
use unhash_core::{HashFunction, DEFAULT_ALGORITHM};

pub fn list() {
    println!("{}", algorithms_table());
}

/// A table of the built-in algorithms and the size of their digests.
fn algorithms_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Algorithm", "Digest size", "Hex digits"]);

    for hash_function in HashFunction::ALL.into_iter().sorted_by_key(|h| h.id()) {
        let mut name = Cell::new(hash_function.id());
        if hash_function.id() == DEFAULT_ALGORITHM {
            name = name.fg(Color::Green);
        }

        let size = hash_function.digest_size();
        table.add_row(vec![
            name,
            Cell::new(format!("{size} bytes")),
            Cell::new(size * 2),
        ]);
    }

    table
}
