//! Data structures for monster content.
//!
//! Monsters and their behaviours are plain data deserialized from RON, so
//! new enemies need no code.
//!
//! **Note:** This module contains no IO - it only parses text it is handed.
//! File loading is handled by `astro_headless` and the world layer.

mod monster_data;

pub use monster_data::{parse_monster, parse_roster, MonsterData};
