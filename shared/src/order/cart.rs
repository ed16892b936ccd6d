//! Cart construction for the sending terminal
//!
//! Selections capture what the operator picked on screen; adding a selection
//! to the cart freezes it into a [`LineItem`] with a derived display name.
//! Menu data (which flavours exist) lives outside this crate — the cart
//! takes flavour strings as given.

use serde::{Deserialize, Serialize};

use super::types::{CakeSide, LineItem, LineItemKind, MilkshakeSize};
use crate::error::AppError;
use crate::util::short_id;

/// Milkshake picker state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MilkshakeSelection {
    pub flavour: String,
    /// Gourmet flavours get a "Gourmet " name prefix
    #[serde(default)]
    pub gourmet: bool,
    #[serde(default)]
    pub size: MilkshakeSize,
    pub qty: u32,
    #[serde(default)]
    pub whipped: bool,
    /// Only honoured when `qty == 1`
    #[serde(default)]
    pub pack: bool,
}

/// Ice cream picker state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IceCreamSelection {
    pub scoops: u8,
    /// One entry per scoop; resized via [`resize_flavours`] when the scoop
    /// count changes
    pub flavours: Vec<String>,
    pub qty: u32,
}

impl IceCreamSelection {
    /// Change the scoop count, keeping existing flavour picks
    pub fn set_scoops(&mut self, scoops: u8) {
        self.scoops = scoops;
        self.flavours = resize_flavours(std::mem::take(&mut self.flavours), scoops as usize);
    }
}

/// Cake picker state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CakeSelection {
    pub name: String,
    pub qty: u32,
    #[serde(default)]
    pub side: CakeSide,
}

/// Resize a flavour list to `n` entries
///
/// Pads by repeating the last entry; truncates from the tail. Surviving
/// entries are never altered. An empty list cannot be padded and is
/// returned as-is.
pub fn resize_flavours(mut flavours: Vec<String>, n: usize) -> Vec<String> {
    if flavours.is_empty() {
        return flavours;
    }
    while flavours.len() < n {
        let last = flavours[flavours.len() - 1].clone();
        flavours.push(last);
    }
    flavours.truncate(n);
    flavours
}

/// An order's cart, built item by item before send
///
/// Item order is significant and preserved: it is the order the operator
/// added things, and the store keeps it verbatim.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Remove a previously added item by its cart-local id
    pub fn remove(&mut self, id: &str) {
        self.items.retain(|item| item.id != id);
    }

    pub fn into_items(self) -> Vec<LineItem> {
        self.items
    }

    /// Add a milkshake; the display name is frozen here
    pub fn add_milkshake(&mut self, sel: MilkshakeSelection) -> Result<(), AppError> {
        if sel.flavour.is_empty() {
            return Err(AppError::validation("milkshake flavour is required"));
        }
        if sel.qty == 0 {
            return Err(AppError::validation("quantity must be at least 1"));
        }
        let prefix = if sel.gourmet { "Gourmet " } else { "" };
        self.items.push(LineItem {
            id: short_id(),
            name: format!("{}{} Milkshake", prefix, sel.flavour),
            qty: sel.qty,
            notes: None,
            kind: LineItemKind::Milkshake {
                size: sel.size,
                whipped: sel.whipped,
                pack: (sel.qty == 1).then_some(sel.pack),
            },
        });
        Ok(())
    }

    /// Add an ice cream; flavours are resized to match the scoop count
    pub fn add_icecream(&mut self, sel: IceCreamSelection) -> Result<(), AppError> {
        if !(1..=3).contains(&sel.scoops) {
            return Err(AppError::validation("scoops must be between 1 and 3"));
        }
        if sel.flavours.is_empty() {
            return Err(AppError::validation("at least one flavour is required"));
        }
        if sel.qty == 0 {
            return Err(AppError::validation("quantity must be at least 1"));
        }
        let flavours = resize_flavours(sel.flavours, sel.scoops as usize);
        self.items.push(LineItem {
            id: short_id(),
            name: format!("{} Ice Cream", flavours.join(" / ")),
            qty: sel.qty,
            notes: None,
            kind: LineItemKind::Icecream {
                scoops: sel.scoops,
                flavours,
            },
        });
        Ok(())
    }

    /// Add a cake
    pub fn add_cake(&mut self, sel: CakeSelection) -> Result<(), AppError> {
        if sel.name.is_empty() {
            return Err(AppError::validation("cake name is required"));
        }
        if sel.qty == 0 {
            return Err(AppError::validation("quantity must be at least 1"));
        }
        self.items.push(LineItem {
            id: short_id(),
            name: sel.name,
            qty: sel.qty,
            notes: None,
            kind: LineItemKind::Cake { side: sel.side },
        });
        Ok(())
    }

    /// Apply an order note uniformly to every item
    ///
    /// An empty note leaves the items untouched.
    pub fn apply_note(&mut self, note: &str) {
        if note.is_empty() {
            return;
        }
        for item in &mut self.items {
            item.notes = Some(note.to_string());
        }
    }
}
