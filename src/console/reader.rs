use crate::SlotNumber;

use super::{Flow, SearchKind, StoreConsole};

fn parse_slot(value: Option<&str>, line: &str) -> Result<SlotNumber, String> {
    let value = value.ok_or(format!("Missing slot in: {line}"))?;
    value
        .parse()
        .map_err(|e| format!("Invalid slot value: {}", e))
}

fn next_key<'a>(words: &mut impl Iterator<Item = &'a str>, line: &str) -> Result<&'a str, String> {
    words.next().ok_or(format!("Missing key in: {line}"))
}

pub fn read_command_line(line: &str, dispatch: &mut dyn StoreConsole) -> Result<Flow, String> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(Flow::Continue);
    };
    if command.starts_with('#') {
        return Ok(Flow::Continue);
    }
    match command {
        "new" => dispatch.new_store()?,
        "init" => dispatch.initialize()?,
        "reset" => dispatch.reset()?,
        "set" => {
            let Some(name) = words.next() else {
                return Err(format!("Missing option name in: {line}"));
            };
            let Some(value) = words.next() else {
                return Err(format!("Missing option value in: {line}"));
            };
            dispatch.set_option(name, value)?
        }
        "options" => dispatch.show_options()?,
        "insert" => dispatch.insert(next_key(&mut words, line)?)?,
        "insertat" => {
            let slot = parse_slot(words.next(), line)?;
            dispatch.insert_at(slot, next_key(&mut words, line)?)?
        }
        "hash" => dispatch.insert_hashed(next_key(&mut words, line)?)?,
        "remove" => dispatch.remove(next_key(&mut words, line)?)?,
        "unhash" => dispatch.remove_hashed(next_key(&mut words, line)?)?,
        "sort" => dispatch.sort()?,
        "search" => {
            let Some(kind) = words.next() else {
                return Err(format!("Missing search kind in: {line}"));
            };
            let kind = match kind {
                "linear" => SearchKind::Linear,
                "binary" => SearchKind::Binary,
                "block" => SearchKind::Block,
                "hashed" => SearchKind::Hashed,
                _ => return Err(format!("Invalid search kind in: {line}")),
            };
            dispatch.search(kind, next_key(&mut words, line)?)?
        }
        "get" => dispatch.get(parse_slot(words.next(), line)?)?,
        "dump" => dispatch.dump()?,
        "stats" => dispatch.stats()?,
        "quit" => return Ok(Flow::Quit),
        _ => return Err(format!("Invalid command: {}", line.trim())),
    }
    Ok(Flow::Continue)
}
