use std::{env, fs::File};

use jscan_class_file::ClassFile;

fn main() {
    pretty_env_logger::init();

    let paths = env::args().skip(1).collect::<Vec<_>>();
    if paths.is_empty() {
        eprintln!("usage: scan <file.class>...");
        return;
    }

    for path in paths {
        // One malformed file must not take the rest of the batch down.
        match File::open(&path)
            .map_err(Into::into)
            .and_then(|file| ClassFile::parse(file))
        {
            Ok(class_file) => print_class(&path, &class_file),
            Err(e) => log::warn!("{}: {}", path, e),
        }
    }
}

fn print_class(path: &str, class_file: &ClassFile) {
    println!("{}:", path);
    println!("    class: {}", class_file.class_name().unwrap_or("?"));
    if let Ok(Some(super_class)) = class_file.super_class_name() {
        println!("    extends: {}", super_class);
    }

    for annotation in class_file.annotation_entries() {
        println!("    annotation: {}", annotation.type_descriptor);
        for pair in &annotation.elements {
            let value = pair
                .value
                .stringify(&class_file.constant_pool)
                .unwrap_or_else(|e| format!("<{}>", e));
            println!("        {} = {}", pair.name, value);
        }
    }
}
