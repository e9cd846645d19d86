//! Row ordering.
//!
//! Ascending order is stable. Descending order is the mirror image of the
//! ascending order, so sorting the same column twice reverses the table
//! exactly. On numeric columns, cells that do not parse as numbers are kept
//! after all numbers in both directions, in their current relative order.

use std::cmp::Ordering;

use dash_model::{Row, SortDirection, parse_metric};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Direction that results from clicking `requested` while the table is sorted
/// by `current`.
pub fn toggle_direction(
    current: Option<&str>,
    current_direction: SortDirection,
    requested: &str,
) -> SortDirection {
    if current == Some(requested) {
        current_direction.flipped()
    } else {
        SortDirection::Asc
    }
}

/// Sorts rows in place by `column`.
pub fn sort_rows(rows: &mut Vec<Row>, column: &str, numeric: bool, direction: SortDirection) {
    if numeric {
        sort_numeric(rows, column, direction);
    } else {
        rows.sort_by(|a, b| compare_text(a.value(column), b.value(column)));
        if direction == SortDirection::Desc {
            rows.reverse();
        }
    }
}

fn sort_numeric(rows: &mut Vec<Row>, column: &str, direction: SortDirection) {
    let mut valid: Vec<(f64, Row)> = Vec::with_capacity(rows.len());
    let mut invalid: Vec<Row> = Vec::new();
    for row in rows.drain(..) {
        match parse_metric(row.value(column)) {
            Some(value) => valid.push((value, row)),
            None => invalid.push(row),
        }
    }
    valid.sort_by(|(a, _), (b, _)| a.total_cmp(b));
    if direction == SortDirection::Desc {
        valid.reverse();
    }
    rows.extend(valid.into_iter().map(|(_, row)| row));
    rows.extend(invalid);
}

/// Restores the order for an existing sort after rows were added.
///
/// Unlike [`sort_rows`], ties keep their current relative order in both
/// directions, so rows already in place do not move among themselves.
pub fn resort_rows(rows: &mut [Row], column: &str, numeric: bool, direction: SortDirection) {
    let directed = |ordering: Ordering| match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    };
    rows.sort_by(|a, b| {
        let (a, b) = (a.value(column), b.value(column));
        if !numeric {
            return directed(compare_text(a, b));
        }
        match (parse_metric(a), parse_metric(b)) {
            (Some(x), Some(y)) => directed(x.total_cmp(&y)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
}

/// Accent- and case-insensitive text ordering.
///
/// Letters compare by their base form first (`Élan` sorts with `e`). Ties
/// fall back to the accented form, then to lower case before upper case.
pub fn compare_text(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| b.cmp(a))
}

fn collation_key(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dash_model::{Record, RowId};
    use proptest::prelude::*;

    fn rows(values: &[&str]) -> Vec<Row> {
        values
            .iter()
            .enumerate()
            .map(|(idx, value)| {
                Row::new(
                    RowId::new(idx as u64),
                    Record::from_iter([("X".to_string(), value.to_string())]),
                )
            })
            .collect()
    }

    fn values(rows: &[Row]) -> Vec<&str> {
        rows.iter().map(|row| row.value("X")).collect()
    }

    fn ids(rows: &[Row]) -> Vec<u64> {
        rows.iter().map(|row| row.id.get()).collect()
    }

    #[test]
    fn test_toggle_direction() {
        assert_eq!(toggle_direction(None, SortDirection::Asc, "A"), SortDirection::Asc);
        assert_eq!(toggle_direction(Some("A"), SortDirection::Asc, "A"), SortDirection::Desc);
        assert_eq!(toggle_direction(Some("A"), SortDirection::Desc, "A"), SortDirection::Asc);
        assert_eq!(toggle_direction(Some("A"), SortDirection::Desc, "B"), SortDirection::Asc);
    }

    #[test]
    fn test_numeric_sort_uses_normalized_values() {
        let mut data = rows(&["10", "9,5", "100%", "2"]);
        sort_rows(&mut data, "X", true, SortDirection::Asc);
        assert_eq!(values(&data), vec!["2", "9,5", "10", "100%"]);
    }

    #[test]
    fn test_invalid_numbers_stay_last_in_both_directions() {
        let mut data = rows(&["n/a", "3", "", "1"]);
        sort_rows(&mut data, "X", true, SortDirection::Asc);
        assert_eq!(values(&data), vec!["1", "3", "n/a", ""]);
        sort_rows(&mut data, "X", true, SortDirection::Desc);
        assert_eq!(values(&data), vec!["3", "1", "n/a", ""]);
    }

    #[test]
    fn test_ascending_is_stable() {
        let mut data = rows(&["b", "a", "B", "a"]);
        sort_rows(&mut data, "X", false, SortDirection::Asc);
        assert_eq!(values(&data), vec!["a", "a", "b", "B"]);
        assert_eq!(ids(&data), vec![1, 3, 0, 2]);
    }

    #[test]
    fn test_descending_mirrors_ascending() {
        let mut data = rows(&["2", "1", "2", "1"]);
        sort_rows(&mut data, "X", true, SortDirection::Asc);
        let ascending = ids(&data);
        sort_rows(&mut data, "X", true, SortDirection::Desc);
        let mut reversed = ascending.clone();
        reversed.reverse();
        assert_eq!(ids(&data), reversed);
    }

    #[test]
    fn test_accented_text_sorts_with_base_letter() {
        let mut data = rows(&["Zeta", "Élan", "Eva", "zürich", "Zoo"]);
        sort_rows(&mut data, "X", false, SortDirection::Asc);
        assert_eq!(values(&data), vec!["Élan", "Eva", "Zeta", "Zoo", "zürich"]);
    }

    #[test]
    fn test_accent_breaks_ties_after_base_form() {
        assert_eq!(compare_text("e", "é"), Ordering::Less);
        assert_eq!(compare_text("café", "Cafe"), Ordering::Greater);
        assert_eq!(compare_text("a", "A"), Ordering::Less);
    }

    #[test]
    fn test_resort_places_new_rows_and_keeps_ties() {
        let mut data = rows(&["2", "1", "2"]);
        sort_rows(&mut data, "X", true, SortDirection::Desc);
        let before = ids(&data);
        data.extend(rows(&["n/a", "3", "2"]).into_iter().map(|mut row| {
            row.id = RowId::new(row.id.get() + 10);
            row
        }));
        resort_rows(&mut data, "X", true, SortDirection::Desc);
        assert_eq!(values(&data), vec!["3", "2", "2", "2", "1", "n/a"]);
        assert_eq!(ids(&data)[1..3], before[0..2]);
    }

    proptest! {
        #[test]
        fn proptest_second_sort_reverses_first(
            cells in prop::collection::vec("[a-c]{0,2}|[0-9]{1,3}", 0..30),
            numeric in any::<bool>(),
        ) {
            let cells: Vec<&str> = cells.iter().map(String::as_str).collect();
            let mut data = rows(&cells);
            sort_rows(&mut data, "X", numeric, SortDirection::Asc);
            let mut first = ids(&data);
            sort_rows(&mut data, "X", numeric, SortDirection::Desc);
            let invalid = if numeric {
                data.iter().filter(|row| parse_metric(row.value("X")).is_none()).count()
            } else {
                0
            };
            let split = first.len() - invalid;
            first[..split].reverse();
            prop_assert_eq!(ids(&data), first);
        }
    }
}
