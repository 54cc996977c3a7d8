//! Pagination arithmetic.

use std::ops::Range;

/// One selectable page marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageButton {
    /// 1-based page number the marker leads to.
    pub page: i64,
    /// Text to show: the page number, or an ellipsis marker for the first
    /// and last pages when the window does not reach them.
    pub label: String,
    /// Whether this is the current page.
    pub selected: bool,
}

impl PageButton {
    fn numbered(page: i64, current: i64) -> Self {
        Self {
            page,
            label: page.to_string(),
            selected: page == current,
        }
    }
}

/// Result of [`Select::paginate`](super::Select::paginate).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginate {
    /// Number of rows before slicing.
    pub count: usize,
    /// Page markers, in order.
    pub buttons: Vec<PageButton>,
}

/// Which rows to keep and which markers to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PagePlan {
    pub(crate) rows: Range<usize>,
    pub(crate) buttons: Vec<PageButton>,
}

/// Plans page `current` of `count` rows.
///
/// Returns `None`, meaning "keep every row, show no buttons", when
/// `current` or `per_page` is not positive or there are no rows. A
/// `current` past the last page is clamped to it.
pub(crate) fn plan(count: usize, current: i64, per_page: i64, nb_buttons: i64) -> Option<PagePlan> {
    if current <= 0 || per_page <= 0 || count == 0 {
        return None;
    }

    let total = i64::try_from(count).unwrap_or(i64::MAX);
    let max_button = total.div_euclid(per_page) + i64::from(total.rem_euclid(per_page) != 0);
    let current = current.min(max_button);

    let offset = usize::try_from((current - 1) * per_page).unwrap_or(count);
    let end = offset
        .saturating_add(usize::try_from(per_page).unwrap_or(usize::MAX))
        .min(count);
    let rows = offset.min(count)..end;

    // A negative window shows nothing, same as an empty one.
    let nb = nb_buttons.clamp(0, max_button);
    let window = if 2 * current <= nb {
        0..nb
    } else if 2 * current > 2 * max_button - nb {
        (max_button - nb)..max_button
    } else {
        let ceil_half = (nb + 1) / 2;
        let floor_half = nb / 2;
        (current - ceil_half)..(current + floor_half)
    };

    let mut buttons: Vec<PageButton> = window
        .map(|i| PageButton::numbered(i + 1, current))
        .collect();

    if let (Some(first), Some(last)) = (buttons.first().map(|b| b.page), buttons.last().map(|b| b.page)) {
        if first > 1 {
            buttons.insert(
                0,
                PageButton {
                    page: 1,
                    label: "1 ... ".to_string(),
                    selected: false,
                },
            );
        }
        if last < max_button {
            buttons.push(PageButton {
                page: max_button,
                label: format!(" ... {max_button}"),
                selected: false,
            });
        }
    }

    Some(PagePlan { rows, buttons })
}
