//! Items step: the add/edit dialog, deletion, reordering and totals.

use log::{debug, warn};

use crate::error::{Result, ValidationError};
use crate::format::{format_amount, format_currency};
use crate::model::{grand_total, QuotationItem};

/// Direction for [`move_item`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

/// Modal form for a single item.
///
/// `open_add` / `open_edit` put a working copy in the dialog; `save` either
/// commits it into a new item sequence or rejects it and stays open.
#[derive(Debug, Clone, Default)]
pub struct ItemDialog {
    current: Option<QuotationItem>,
    editing: bool,
}

impl ItemDialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn title(&self) -> &'static str {
        if self.editing {
            "Edit Item"
        } else {
            "Add New Item"
        }
    }

    pub fn current(&self) -> Option<&QuotationItem> {
        self.current.as_ref()
    }

    pub fn open_add(&mut self) {
        self.editing = false;
        self.current = Some(QuotationItem::blank());
    }

    /// Open the dialog on a copy of the item with `id`. Returns false when no such item exists.
    pub fn open_edit(&mut self, items: &[QuotationItem], id: &str) -> bool {
        match items.iter().find(|i| i.id == id) {
            Some(item) => {
                self.editing = true;
                self.current = Some(item.clone());
                true
            }
            None => false,
        }
    }

    pub fn cancel(&mut self) {
        self.current = None;
        self.editing = false;
    }

    fn current_mut(&mut self) -> Option<&mut QuotationItem> {
        self.current.as_mut()
    }

    pub fn set_name(&mut self, name: &str) {
        if let Some(item) = self.current_mut() {
            item.name = name.to_string();
        }
    }

    pub fn set_description(&mut self, description: &str) {
        if let Some(item) = self.current_mut() {
            item.description = description.to_string();
        }
    }

    pub fn set_quantity(&mut self, quantity: i64) {
        if let Some(item) = self.current_mut() {
            item.quantity = quantity;
        }
    }

    pub fn set_unit_price(&mut self, unit_price: f64) {
        if let Some(item) = self.current_mut() {
            item.unit_price = unit_price;
        }
    }

    /// Parse quantity text the way a number field does: garbage becomes 0.
    pub fn set_quantity_text(&mut self, text: &str) {
        self.set_quantity(text.trim().parse().unwrap_or(0));
    }

    pub fn set_unit_price_text(&mut self, text: &str) {
        self.set_unit_price(text.trim().parse().unwrap_or(0.0));
    }

    /// Commit the working item into a copy of `items`.
    ///
    /// Rejected when the name is empty, quantity ≤ 0 or unit price ≤ 0; the
    /// dialog then stays open and the caller keeps its sequence.
    pub fn save(&mut self, items: &[QuotationItem]) -> Result<Vec<QuotationItem>> {
        let item = match &self.current {
            Some(item) => item.clone(),
            None => return Err(crate::Error::Other("item dialog is not open".into())),
        };
        if !item.is_valid() {
            warn!(
                "rejected item save: name={:?} quantity={} unit_price={}",
                item.name, item.quantity, item.unit_price
            );
            return Err(ValidationError::InvalidItem.into());
        }

        let updated = if self.editing {
            items
                .iter()
                .map(|existing| if existing.id == item.id { item.clone() } else { existing.clone() })
                .collect()
        } else {
            let mut next = items.to_vec();
            next.push(item);
            next
        };
        debug!("saved item ({} items now)", updated.len());
        self.cancel();
        Ok(updated)
    }
}

/// Remove the item with `id`. Unknown ids leave the sequence as it was.
pub fn delete_item(items: &[QuotationItem], id: &str) -> Vec<QuotationItem> {
    items.iter().filter(|i| i.id != id).cloned().collect()
}

/// Swap the item at `index` with its neighbour.
///
/// Moving the first item up, the last item down, or an out-of-range index is
/// a no-op.
pub fn move_item(items: &[QuotationItem], index: usize, direction: MoveDirection) -> Vec<QuotationItem> {
    let mut next = items.to_vec();
    let target = match direction {
        MoveDirection::Up if index > 0 && index < items.len() => index - 1,
        MoveDirection::Down if index < items.len().saturating_sub(1) => index + 1,
        _ => return next,
    };
    next.swap(index, target);
    next
}

/// Items step component. Holds only dialog state; the items and notes
/// belong to the controller.
#[derive(Debug, Clone, Default)]
pub struct ItemsStep {
    pub dialog: ItemDialog,
}

impl ItemsStep {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render_text(&self, items: &[QuotationItem], notes: &str, currency: &str) -> String {
        let mut out = String::new();
        if items.is_empty() {
            out.push_str("No items added yet. Use `add` to add your first item.\n");
        } else {
            out.push_str(&format!(
                "{:>3}  {:<30} {:>8} {:>16} {:>16}\n",
                "#",
                "Item",
                "Quantity",
                format!("Unit Price ({})", currency),
                format!("Total ({})", currency)
            ));
            for (i, item) in items.iter().enumerate() {
                out.push_str(&format!(
                    "{:>3}  {:<30} {:>8} {:>16} {:>16}\n",
                    i + 1,
                    item.name,
                    item.quantity,
                    format_amount(item.unit_price),
                    format_amount(item.total())
                ));
                if !item.description.is_empty() {
                    out.push_str(&format!("     {}\n", item.description));
                }
            }
            out.push_str(&format!(
                "{:>60} {:>16}\n",
                "Grand Total:",
                format_currency(grand_total(items), currency)
            ));
        }
        if !notes.is_empty() {
            out.push_str(&format!("\nNotes: {}\n", notes));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn sample() -> Vec<QuotationItem> {
        vec![
            QuotationItem::new("A", 1, 10.0),
            QuotationItem::new("B", 2, 20.0),
            QuotationItem::new("C", 3, 30.0),
        ]
    }

    fn names(items: &[QuotationItem]) -> Vec<&str> {
        items.iter().map(|i| i.name.as_str()).collect()
    }

    #[test]
    fn add_appends_valid_item() {
        let mut dialog = ItemDialog::new();
        dialog.open_add();
        assert_eq!(dialog.title(), "Add New Item");
        dialog.set_name("Widget");
        dialog.set_quantity(3);
        dialog.set_unit_price(100.0);
        let items = dialog.save(&[]).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].total(), 300.0);
        assert!(!dialog.is_open());
    }

    #[test]
    fn invalid_save_keeps_sequence_and_dialog() {
        let existing = sample();
        for (name, qty, price) in [("", 1, 1.0), ("X", 0, 1.0), ("X", 1, 0.0), ("X", -1, 5.0)] {
            let mut dialog = ItemDialog::new();
            dialog.open_add();
            dialog.set_name(name);
            dialog.set_quantity(qty);
            dialog.set_unit_price(price);
            let err = dialog.save(&existing).unwrap_err();
            assert!(matches!(err, Error::Validation(ValidationError::InvalidItem)));
            assert!(dialog.is_open());
        }
        assert_eq!(existing.len(), 3);
    }

    #[test]
    fn edit_replaces_in_place() {
        let items = sample();
        let mut dialog = ItemDialog::new();
        assert!(dialog.open_edit(&items, &items[1].id));
        assert_eq!(dialog.title(), "Edit Item");
        dialog.set_quantity(5);
        let updated = dialog.save(&items).unwrap();
        assert_eq!(names(&updated), vec!["A", "B", "C"]);
        assert_eq!(updated[1].quantity, 5);
        assert_eq!(updated[1].id, items[1].id);
    }

    #[test]
    fn open_edit_unknown_id() {
        let mut dialog = ItemDialog::new();
        assert!(!dialog.open_edit(&sample(), "missing"));
        assert!(!dialog.is_open());
    }

    #[test]
    fn text_fields_parse_like_number_inputs() {
        let mut dialog = ItemDialog::new();
        dialog.open_add();
        dialog.set_quantity_text("abc");
        dialog.set_unit_price_text(" 12.5 ");
        let current = dialog.current().unwrap();
        assert_eq!(current.quantity, 0);
        assert_eq!(current.unit_price, 12.5);
    }

    #[test]
    fn delete_by_id() {
        let items = sample();
        let updated = delete_item(&items, &items[0].id);
        assert_eq!(names(&updated), vec!["B", "C"]);
        assert_eq!(delete_item(&items, "nope").len(), 3);
    }

    #[test]
    fn moves_swap_neighbours() {
        let items = sample();
        assert_eq!(names(&move_item(&items, 1, MoveDirection::Up)), vec!["B", "A", "C"]);
        assert_eq!(names(&move_item(&items, 1, MoveDirection::Down)), vec!["A", "C", "B"]);
    }

    #[test]
    fn boundary_moves_are_noops() {
        let items = sample();
        assert_eq!(move_item(&items, 0, MoveDirection::Up), items);
        assert_eq!(move_item(&items, 2, MoveDirection::Down), items);
        assert_eq!(move_item(&items, 9, MoveDirection::Up), items);
        assert_eq!(move_item(&items, 9, MoveDirection::Down), items);
        assert_eq!(move_item(&items, usize::MAX, MoveDirection::Down), items);
        assert_eq!(move_item(&[], 0, MoveDirection::Down), Vec::<QuotationItem>::new());
    }

    #[test]
    fn text_view_shows_grand_total() {
        let items = vec![QuotationItem::new("Widget", 3, 100.0)];
        let text = ItemsStep::new().render_text(&items, "Thanks", "EGP");
        assert!(text.contains("Grand Total:"));
        assert!(text.contains("EGP 300.00"));
        assert!(text.contains("Notes: Thanks"));
    }
}
