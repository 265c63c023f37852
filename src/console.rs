use std::{fmt, io::Write};

use crate::{
    address::{BlockedSpace, FlatSpace},
    options::{Layout, StoreOptions},
    search::{SearchMethod, SearchOutcome},
    store::SlotStore,
    SlotNumber,
};
pub mod reader;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SearchKind {
    Linear,
    Binary,
    Block,
    Hashed,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Commands a line-oriented front end can issue against a store.
pub trait StoreConsole {
    // Replace the store with a fresh one built from the current options.
    fn new_store(&mut self) -> Result<(), String>;
    fn initialize(&mut self) -> Result<(), String>;
    fn reset(&mut self) -> Result<(), String>;
    fn set_option(&mut self, name: &str, value: &str) -> Result<(), String>;
    fn show_options(&mut self) -> Result<(), String>;

    fn insert(&mut self, key: &str) -> Result<(), String>;
    fn insert_at(&mut self, slot: SlotNumber, key: &str) -> Result<(), String>;
    // Insert through the configured hash function and resolver.
    fn insert_hashed(&mut self, key: &str) -> Result<(), String>;
    fn remove(&mut self, key: &str) -> Result<(), String>;
    fn remove_hashed(&mut self, key: &str) -> Result<(), String>;
    fn sort(&mut self) -> Result<(), String>;

    fn search(&mut self, kind: SearchKind, key: &str) -> Result<(), String>;
    fn get(&mut self, slot: SlotNumber) -> Result<(), String>;
    // One `slot,key` line per slot, key left blank when empty.
    fn dump(&mut self) -> Result<(), String>;
    fn stats(&mut self) -> Result<(), String>;
}

enum Store {
    Flat(SlotStore<FlatSpace>),
    Blocked(SlotStore<BlockedSpace>),
}

macro_rules! with_store {
    ($store:expr, $s:ident => $body:expr) => {
        match $store {
            Store::Flat($s) => $body,
            Store::Blocked($s) => $body,
        }
    };
}

impl Store {
    fn build(options: &StoreOptions) -> Result<Store, String> {
        let store = match options.layout {
            Layout::Flat => Store::Flat(options.flat_store().map_err(|e| e.to_string())?),
            Layout::Blocked => {
                Store::Blocked(options.blocked_store().map_err(|e| e.to_string())?)
            }
        };
        Ok(store)
    }
}

/// Drives a single store from text commands, writing results to `out`.
pub struct Console<W: Write> {
    options: StoreOptions,
    store: Option<Store>,
    out: W,
}

impl<W: Write> Console<W> {
    pub fn new(out: W) -> Console<W> {
        Console {
            options: StoreOptions::default(),
            store: None,
            out,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, line: impl fmt::Display) -> Result<(), String> {
        writeln!(self.out, "{line}").map_err(|e| e.to_string())
    }

    fn store(&mut self) -> Result<&mut Store, String> {
        self.store
            .as_mut()
            .ok_or(String::from("No store, create one with 'new'"))
    }

    fn method(&self, kind: SearchKind) -> Result<SearchMethod, String> {
        Ok(match kind {
            SearchKind::Linear => SearchMethod::Linear,
            SearchKind::Binary => SearchMethod::Binary,
            SearchKind::Block => SearchMethod::BlockBinary,
            SearchKind::Hashed => SearchMethod::Hashed {
                hash: self.options.hash_function().map_err(|e| e.to_string())?,
                resolver: self.options.resolver,
            },
        })
    }

    fn report(&mut self, key: &str, outcome: &SearchOutcome) -> Result<(), String> {
        for step in &outcome.trace {
            self.emit(format!("  {step}"))?;
        }
        match outcome.slot {
            Some(slot) => self.emit(format!(
                "found {key} at slot {slot} after {} comparisons",
                outcome.comparisons()
            )),
            None => self.emit(format!(
                "{key} not found after {} comparisons",
                outcome.comparisons()
            )),
        }
    }
}

impl<W: Write> StoreConsole for Console<W> {
    fn new_store(&mut self) -> Result<(), String> {
        let store = Store::build(&self.options)?;
        let capacity = with_store!(&store, s => s.capacity());
        self.store = Some(store);
        self.emit(format!("new store with {capacity} slots"))
    }

    fn initialize(&mut self) -> Result<(), String> {
        with_store!(self.store()?, s => s.initialize());
        self.emit("initialized")
    }

    fn reset(&mut self) -> Result<(), String> {
        with_store!(self.store()?, s => s.reset());
        self.emit("reset")
    }

    fn set_option(&mut self, name: &str, value: &str) -> Result<(), String> {
        self.options.set_option(name, value)
    }

    fn show_options(&mut self) -> Result<(), String> {
        let options = self.options.to_string();
        self.emit(options)
    }

    fn insert(&mut self, key: &str) -> Result<(), String> {
        let slot = with_store!(self.store()?, s => s.insert(key)).map_err(|e| e.to_string())?;
        self.emit(format!("inserted {key} at slot {slot}"))
    }

    fn insert_at(&mut self, slot: SlotNumber, key: &str) -> Result<(), String> {
        with_store!(self.store()?, s => s.insert_at(key, slot)).map_err(|e| e.to_string())?;
        self.emit(format!("inserted {key} at slot {slot}"))
    }

    fn insert_hashed(&mut self, key: &str) -> Result<(), String> {
        let hash = self.options.hash_function().map_err(|e| e.to_string())?;
        let resolver = self.options.resolver;
        let slot = with_store!(self.store()?, s => s.insert_hashed(key, &hash, resolver))
            .map_err(|e| e.to_string())?;
        self.emit(format!("inserted {key} at slot {slot} ({hash}, {resolver})"))
    }

    fn remove(&mut self, key: &str) -> Result<(), String> {
        let removed = with_store!(self.store()?, s => s.remove(key)).map_err(|e| e.to_string())?;
        self.emit(if removed {
            format!("removed {key}")
        } else {
            format!("{key} not present")
        })
    }

    fn remove_hashed(&mut self, key: &str) -> Result<(), String> {
        let hash = self.options.hash_function().map_err(|e| e.to_string())?;
        let resolver = self.options.resolver;
        let removed = with_store!(self.store()?, s => s.remove_hashed(key, &hash, resolver))
            .map_err(|e| e.to_string())?;
        self.emit(if removed {
            format!("removed {key}")
        } else {
            format!("{key} not present")
        })
    }

    fn sort(&mut self) -> Result<(), String> {
        with_store!(self.store()?, s => s.sort()).map_err(|e| e.to_string())?;
        self.emit("sorted")
    }

    fn search(&mut self, kind: SearchKind, key: &str) -> Result<(), String> {
        let method = self.method(kind)?;
        let outcome =
            with_store!(self.store()?, s => s.search(key, &method)).map_err(|e| e.to_string())?;
        self.report(key, &outcome)
    }

    fn get(&mut self, slot: SlotNumber) -> Result<(), String> {
        let key = with_store!(self.store()?, s => s.get(slot).map(|k| k.cloned()))
            .map_err(|e| e.to_string())?;
        match key {
            Some(key) => self.emit(format!("slot {slot}: {key}")),
            None => self.emit(format!("slot {slot}: -")),
        }
    }

    fn dump(&mut self) -> Result<(), String> {
        let dump = with_store!(self.store()?, s => s.dump());
        for (slot, key) in dump {
            match key {
                Some(key) => self.emit(format!("{slot},{key}"))?,
                None => self.emit(format!("{slot},"))?,
            }
        }
        Ok(())
    }

    fn stats(&mut self) -> Result<(), String> {
        let stats = with_store!(self.store()?, s => s.stats().to_string());
        self.emit(stats)
    }
}
