use std::error::Error;
use std::fs::{self, File};
use std::io::prelude::*;
use std::path::{Path, PathBuf};

pub fn read_file<P: AsRef<Path>>(path: P) -> Result<String, Box<dyn Error>> {
    let mut file = File::open(path)?;

    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    Ok(contents)
}

pub fn write_file<P: AsRef<Path>>(path: P, text: &str) -> Result<(), Box<dyn Error>> {
    let mut file = File::create(path)?;
    file.write_all(text.as_ref())?;
    Ok(())
}

/// Lists the `Level<N>.txt` files of a directory in natural order
/// (Level2 before Level10).
pub fn discover_levels<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_level = path
            .file_name()
            .and_then(|name| name.to_str())
            .map_or(false, is_level_name);
        if is_level {
            found.push(path);
        }
    }

    found.sort_by(|a, b| {
        let a = a.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let b = b.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        natord::compare(a, b)
    });
    Ok(found)
}

fn is_level_name(name: &str) -> bool {
    name.strip_prefix("Level")
        .and_then(|rest| rest.strip_suffix(".txt"))
        .map_or(false, |digits| {
            !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
        })
}
