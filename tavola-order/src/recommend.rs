use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::Order;

/// How many order lines paired a dish with a combo.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ComboCount {
    pub combo_id: String,
    pub combo_name: Option<String>,
    pub count: u64,
}

/// Best combo for a dish, enriched from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComboSuggestion {
    pub dish_id: String,
    pub dish_name: Option<String>,
    pub combo_id: String,
    pub combo_name: Option<String>,
    pub count: u64,
    pub avg_extra: f64,
}

/// Counts lines containing `dish_id` with a combo, grouped by combo id and
/// name, most frequent first. Ties fall back to combo id so results are
/// stable.
pub fn rank_combos<'a, I>(orders: I, dish_id: &str, limit: usize) -> Vec<ComboCount>
where
    I: IntoIterator<Item = &'a Order>,
{
    let mut counts: HashMap<(String, Option<String>), u64> = HashMap::new();

    for item in orders.into_iter().flat_map(|o| o.items.iter()) {
        if item.menu_id != dish_id {
            continue;
        }
        if let Some(combo_id) = &item.combo_id {
            *counts
                .entry((combo_id.clone(), item.combo_name.clone()))
                .or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<ComboCount> = counts
        .into_iter()
        .map(|((combo_id, combo_name), count)| ComboCount {
            combo_id,
            combo_name,
            count,
        })
        .collect();

    sort_ranked(&mut ranked);
    ranked.truncate(limit);
    ranked
}

/// Ordering shared by every store: count desc, then combo id, then name.
fn sort_ranked(ranked: &mut [ComboCount]) {
    ranked.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.combo_id.cmp(&b.combo_id))
            .then_with(|| a.combo_name.cmp(&b.combo_name))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrderItem;
    use chrono::Utc;

    fn line(menu_id: &str, combo: Option<(&str, &str)>) -> OrderItem {
        OrderItem {
            menu_id: menu_id.to_string(),
            name: format!("dish {}", menu_id),
            qty: 1,
            price: 10.0,
            combo_id: combo.map(|(id, _)| id.to_string()),
            combo_name: combo.map(|(_, name)| name.to_string()),
        }
    }

    fn order(items: Vec<OrderItem>) -> Order {
        Order::new("Anna".into(), "1234567890".into(), None, items, 10.0, None, Utc::now())
    }

    #[test]
    fn test_ranks_by_frequency() {
        let orders = vec![
            order(vec![line("1", Some(("wine", "Wine"))), line("2", Some(("drink", "Drink")))]),
            order(vec![line("1", Some(("drink", "Drink")))]),
            order(vec![line("1", Some(("wine", "Wine"))), line("1", None)]),
        ];

        let ranked = rank_combos(&orders, "1", 3);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].combo_id, "wine");
        assert_eq!(ranked[0].count, 2);
        assert_eq!(ranked[1].combo_id, "drink");
        assert_eq!(ranked[1].count, 1);
    }

    #[test]
    fn test_limit_and_ties() {
        let orders = vec![order(vec![
            line("1", Some(("c", "C"))),
            line("1", Some(("a", "A"))),
            line("1", Some(("b", "B"))),
            line("1", Some(("d", "D"))),
        ])];

        let ranked = rank_combos(&orders, "1", 3);
        let ids: Vec<&str> = ranked.iter().map(|c| c.combo_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_ties_use_byte_order_before_limit() {
        let mut unnamed = line("1", Some(("zest", "")));
        unnamed.combo_name = None;
        let orders = vec![order(vec![
            line("1", Some(("beer", "Beer"))),
            line("1", Some(("Wine", "Wine"))),
            line("1", Some(("zest", "Zest"))),
            unnamed,
        ])];

        let ranked = rank_combos(&orders, "1", 3);
        let keys: Vec<(&str, Option<&str>)> = ranked
            .iter()
            .map(|c| (c.combo_id.as_str(), c.combo_name.as_deref()))
            .collect();
        assert_eq!(keys, vec![("Wine", Some("Wine")), ("beer", Some("Beer")), ("zest", None)]);
    }

    #[test]
    fn test_unknown_dish_is_empty() {
        let orders = vec![order(vec![line("1", Some(("wine", "Wine")))])];
        assert!(rank_combos(&orders, "42", 1).is_empty());
    }
}
