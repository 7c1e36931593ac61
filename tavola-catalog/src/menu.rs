use serde::{Deserialize, Serialize};

/// A dish on the menu
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Dish {
    pub id: String,
    pub title: String,
    pub category: String,
    pub price: f64,
    pub image: Option<String>,
}

/// Add-on bundle that can be paired with any dish
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Combo {
    pub combo_id: String,
    pub combo_name: String,
    pub extra_price: f64,
}

/// Static catalog: dishes plus the combos that apply to all of them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Menu {
    pub dishes: Vec<Dish>,
    pub combos: Vec<Combo>,
}

#[derive(Debug, thiserror::Error)]
pub enum MenuError {
    #[error("Menu file unreadable: {0}")]
    Io(#[from] std::io::Error),

    #[error("Menu file malformed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate id in menu: {0}")]
    DuplicateId(String),
}

impl Menu {
    /// The menu the restaurant ships with.
    pub fn reference() -> Self {
        let dish = |id: &str, title: &str, category: &str, price: f64| Dish {
            id: id.to_string(),
            title: title.to_string(),
            category: category.to_string(),
            price,
            image: Some(format!("/dishes/{}.png", id)),
        };
        let combo = |id: &str, name: &str, extra: f64| Combo {
            combo_id: id.to_string(),
            combo_name: name.to_string(),
            extra_price: extra,
        };

        Self {
            dishes: vec![
                dish("1", "Margherita", "Pizza", 11.50),
                dish("2", "Tagliatelle al Ragu", "Pasta", 14.00),
                dish("3", "Risotto ai Funghi", "Risotto", 15.50),
                dish("4", "Caesar Salad", "Salad", 9.00),
                dish("5", "Grilled Sea Bass", "Main", 21.00),
                dish("6", "Tiramisu", "Dessert", 7.50),
            ],
            combos: vec![
                combo("drink", "Soft Drink", 2.50),
                combo("fries", "Fries & Dip", 3.75),
                combo("wine", "Glass of House Wine", 5.00),
                combo("dessert", "Dessert of the Day", 4.25),
            ],
        }
    }

    /// Loads a menu from its JSON representation.
    pub fn from_json(raw: &str) -> Result<Self, MenuError> {
        let menu: Menu = serde_json::from_str(raw)?;
        menu.check_unique_ids()?;
        Ok(menu)
    }

    pub fn load(path: &str) -> Result<Self, MenuError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn dish(&self, id: &str) -> Option<&Dish> {
        self.dishes.iter().find(|d| d.id == id)
    }

    pub fn combo(&self, combo_id: &str) -> Option<&Combo> {
        self.combos.iter().find(|c| c.combo_id == combo_id)
    }

    fn check_unique_ids(&self) -> Result<(), MenuError> {
        let mut seen = std::collections::HashSet::new();
        for id in self.dishes.iter().map(|d| &d.id).chain(self.combos.iter().map(|c| &c.combo_id)) {
            if !seen.insert(id) {
                return Err(MenuError::DuplicateId(id.clone()));
            }
        }
        Ok(())
    }
}

impl Default for Menu {
    fn default() -> Self {
        Self::reference()
    }
}
