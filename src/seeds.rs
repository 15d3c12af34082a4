//! Built-in roadmap catalog, served when the config file has no `[[catalog]]`.

use crate::domain::CatalogCard;

pub fn seed_catalog_cards() -> Vec<CatalogCard> {
  vec![
    CatalogCard {
      id: 1,
      title: "React Developer Roadmap".into(),
      progress: 65,
      xp: 1200,
      color: "from-teal-500 to-green-500".into(),
    },
    CatalogCard {
      id: 2,
      title: "Data Structures & Algorithms".into(),
      progress: 45,
      xp: 900,
      color: "from-orange-400 to-yellow-500".into(),
    },
    CatalogCard {
      id: 3,
      title: "System Design Fundamentals".into(),
      progress: 30,
      xp: 600,
      color: "from-blue-400 to-indigo-500".into(),
    },
  ]
}
