//! Ordering rules for the shopping list.
//!
//! The canonical order is `(checked, sort_order, name)`: open items before
//! checked items, explicit order within each partition, name only as the
//! tie-break. These operations never talk to the store; the sync gateway in
//! [`super::service`] wraps them with round trips.

use tracing::warn;

use weekmenu_db::models::ShoppingItem;

use super::ListError;

/// A sorted view over the list. Lazy and restartable; the underlying list
/// is never mutated.
pub fn sorted_view(items: &[ShoppingItem]) -> impl Iterator<Item = &ShoppingItem> {
    let mut refs: Vec<&ShoppingItem> = items.iter().collect();
    refs.sort_by(|a, b| {
        a.checked
            .cmp(&b.checked)
            .then(a.sort_order.cmp(&b.sort_order))
            .then_with(|| a.name.cmp(&b.name))
    });
    refs.into_iter()
}

/// Set one item's `checked` flag in place.
///
/// `sort_order` is deliberately untouched: the item visually moves to the
/// other partition on the next [`sorted_view`], and toggling back restores
/// its old position among the open items.
pub fn toggle_checked(items: &mut [ShoppingItem], id: i64, checked: bool) -> Result<(), ListError> {
    let item = items
        .iter_mut()
        .find(|i| i.id == id)
        .ok_or(ListError::NotFound(id))?;
    item.checked = checked;
    Ok(())
}

/// Relocate `moved_id` to sit immediately before or after `target_id`
/// within the target's partition, then renumber that partition 0..n.
///
/// A move that would cross the checked/unchecked boundary is rejected with
/// [`ListError::InvalidMove`] and leaves the list untouched; checked state
/// only changes through [`toggle_checked`].
pub fn move_item(
    items: &mut [ShoppingItem],
    moved_id: i64,
    target_id: i64,
    insert_after: bool,
) -> Result<(), ListError> {
    if moved_id == target_id {
        return Ok(());
    }

    let moved = items
        .iter()
        .find(|i| i.id == moved_id)
        .ok_or(ListError::NotFound(moved_id))?;
    let target = items
        .iter()
        .find(|i| i.id == target_id)
        .ok_or(ListError::NotFound(target_id))?;

    if moved.checked != target.checked {
        return Err(ListError::InvalidMove {
            moved: moved_id,
            target: target_id,
        });
    }
    let partition = target.checked;

    // Work on the partition in display order, as the drag gesture sees it.
    let mut section: Vec<i64> = sorted_view(items)
        .filter(|i| i.checked == partition)
        .map(|i| i.id)
        .collect();

    let from_index = section.iter().position(|&id| id == moved_id).expect("moved id is in its partition");
    let target_index = section.iter().position(|&id| id == target_id).expect("target id is in its partition");

    section.remove(from_index);
    let mut next_index = target_index;
    if insert_after {
        next_index += 1;
    }
    if from_index < target_index {
        next_index -= 1;
    }
    let next_index = next_index.min(section.len());
    section.insert(next_index, moved_id);

    // Renumber the affected partition as consecutive integers.
    for (position, id) in section.iter().enumerate() {
        let item = items
            .iter_mut()
            .find(|i| i.id == *id)
            .expect("partition ids came from the list");
        item.sort_order = position as i64;
    }

    Ok(())
}

/// Remove one item. The rest keep their `sort_order`; gaps are harmless
/// since ordering is relative.
pub fn remove_item(items: &mut Vec<ShoppingItem>, id: i64) -> Result<ShoppingItem, ListError> {
    let index = items
        .iter()
        .position(|i| i.id == id)
        .ok_or(ListError::NotFound(id))?;
    Ok(items.remove(index))
}

/// Append a new unchecked item after the last open item.
///
/// An empty name is rejected; a malformed quantity (negative or NaN) is
/// coerced to 0 rather than rejected.
pub fn append_item(
    items: &mut Vec<ShoppingItem>,
    id: i64,
    name: &str,
    quantity: f64,
    unit: &str,
) -> Result<(), ListError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ListError::Validation("item name must not be empty".to_owned()));
    }

    let quantity = if quantity.is_nan() || quantity < 0.0 {
        warn!(name, quantity, "coercing malformed quantity to 0");
        0.0
    } else {
        quantity
    };

    let sort_order = items
        .iter()
        .filter(|i| !i.checked)
        .map(|i| i.sort_order)
        .max()
        .map(|max| max + 1)
        .unwrap_or(0);

    items.push(ShoppingItem {
        id,
        name: name.to_owned(),
        quantity,
        unit: unit.trim().to_owned(),
        checked: false,
        sort_order,
        show_quantity: true,
    });
    Ok(())
}
