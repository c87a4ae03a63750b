#![cfg(loom)]

mod slot_table;
