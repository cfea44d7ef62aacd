//! Attribute/colour registry
//!
//! Session-owned lookup tables: symbolic attribute codes to attribute bits,
//! palette colour pairs to pair indices (and back), and device key codes to
//! symbolic keys (and back).
//!
//! The colour tables are built lazily, on the first colour request, and are
//! never rebuilt. Pair indices follow `fg * 8 + bg` over the palette order,
//! so every (fg, bg) combination has exactly one index in `0..64`.

use std::collections::HashMap;
use tracing::{debug, info};

use crate::core::backend::Backend;
use crate::core::term::{AttrFlags, Colour, ColourPair, Screen};
use crate::error::{Error, Result};
use crate::ui::keymapper::{key_table, Key};

/// Symbolic attribute codes
const ATTR_CODES: &[(char, AttrFlags)] = &[
    ('N', AttrFlags::empty()),
    ('S', AttrFlags::STANDOUT),
    ('U', AttrFlags::UNDERLINE),
    ('R', AttrFlags::REVERSE),
    ('K', AttrFlags::BLINK),
    ('D', AttrFlags::DIM),
    ('B', AttrFlags::BOLD),
    ('I', AttrFlags::ITALIC),
    ('X', AttrFlags::INVISIBLE),
    ('P', AttrFlags::PROTECT),
    ('A', AttrFlags::ALTCHARSET),
];

#[derive(Debug)]
pub struct Registry {
    forward: HashMap<(Colour, Colour), ColourPair>,
    reverse: HashMap<ColourPair, (Colour, Colour)>,
    built: bool,
    /// Register pairs with the terminal when it supports colour
    colour_enabled: bool,
    keys: HashMap<u16, Key>,
    codes: HashMap<Key, u16>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Registry {
    pub fn new(colour_enabled: bool) -> Self {
        let keys: HashMap<u16, Key> = key_table().collect();
        let codes = keys.iter().map(|(&code, &key)| (key, code)).collect();
        Self {
            forward: HashMap::new(),
            reverse: HashMap::new(),
            built: false,
            colour_enabled,
            keys,
            codes,
        }
    }

    /// Combine the bits of every known code in `code`; unknown letters are
    /// skipped
    pub fn attrs_from_code(&self, code: &str) -> AttrFlags {
        code.chars()
            .filter_map(|c| ATTR_CODES.iter().find(|(k, _)| *k == c).map(|(_, f)| *f))
            .fold(AttrFlags::empty(), |acc, flags| acc | flags)
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    /// Build both colour maps and register the pairs with the terminal
    pub fn build_colour_pairs<B: Backend>(&mut self, screen: &mut Screen<B>) -> Result<()> {
        if self.built {
            return Err(Error::invariant("colour pairs are already built"));
        }
        let register = self.colour_enabled && screen.has_colours();
        for fg in Colour::ALL {
            for bg in Colour::ALL {
                let Some(pair) = ColourPair::new(fg.index() * 8 + bg.index()) else {
                    continue;
                };
                self.forward.insert((fg, bg), pair);
                self.reverse.insert(pair, (fg, bg));
                if register {
                    screen.init_pair(pair, fg, bg);
                }
            }
        }
        self.built = true;
        info!(
            "colour pairs built ({} pairs, registered={})",
            self.forward.len(),
            register
        );
        Ok(())
    }

    /// Build on first use; no-op once built
    pub fn ensure_colour_pairs<B: Backend>(&mut self, screen: &mut Screen<B>) -> Result<()> {
        if self.built {
            return Ok(());
        }
        self.build_colour_pairs(screen)
    }

    pub fn colour_pair(&self, fg: Colour, bg: Colour) -> Result<ColourPair> {
        if !self.built {
            return Err(Error::invariant("colour pair requested before the table was built"));
        }
        self.forward
            .get(&(fg, bg))
            .copied()
            .ok_or_else(|| Error::invariant(format!("no pair for {:?} on {:?}", fg, bg)))
    }

    /// Foreground and background of a pair
    pub fn decompose(&self, pair: ColourPair) -> Result<(Colour, Colour)> {
        if !self.built {
            return Err(Error::invariant("colour pair decomposed before the table was built"));
        }
        self.reverse
            .get(&pair)
            .copied()
            .ok_or_else(|| Error::invariant(format!("{} is not registered", pair)))
    }

    /// Symbolic key for a device code
    pub fn decode(&self, code: u16) -> Option<Key> {
        let key = self.keys.get(&code).copied();
        if key.is_none() {
            debug!("unknown key code {:o}", code);
        }
        key
    }

    /// Device code of a symbolic key
    pub fn code_of(&self, key: Key) -> Option<u16> {
        self.codes.get(&key).copied()
    }
}
