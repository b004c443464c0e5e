use chrono::Utc;
use memeplayers_types::api::CoinRequest;
use memeplayers_types::models::{Coin, CoinCategory};
use rusqlite::types::Value;
use rusqlite::{Connection, Row, params, params_from_iter};
use tracing::info;
use uuid::Uuid;

use super::{Listing, Window, count_rows, window_clause};
use crate::error::OptionalExt;
use crate::models::parse_col;
use crate::{Database, Result};

const COIN_COLUMNS: &str =
    "id, name, symbol, description, category, logo, created_by, created_at, total_votes";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoinOrdering {
    #[default]
    CreatedAsc,
    CreatedDesc,
    TotalVotesAsc,
    TotalVotesDesc,
}

impl CoinOrdering {
    /// Parse an `ordering` query value; a leading `-` means descending.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "created_at" => Some(Self::CreatedAsc),
            "-created_at" => Some(Self::CreatedDesc),
            "total_votes" => Some(Self::TotalVotesAsc),
            "-total_votes" => Some(Self::TotalVotesDesc),
            _ => None,
        }
    }

    fn sql(self) -> &'static str {
        match self {
            Self::CreatedAsc => "created_at ASC, id",
            Self::CreatedDesc => "created_at DESC, id",
            Self::TotalVotesAsc => "total_votes ASC, created_at",
            Self::TotalVotesDesc => "total_votes DESC, created_at",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CoinFilter {
    pub category: Option<CoinCategory>,
    /// Case-insensitive substring of name or symbol.
    pub search: Option<String>,
    pub ordering: CoinOrdering,
}

fn coin_row(row: &Row<'_>) -> rusqlite::Result<Coin> {
    Ok(Coin {
        id: parse_col(row, 0)?,
        name: row.get(1)?,
        symbol: row.get(2)?,
        description: row.get(3)?,
        category: parse_col(row, 4)?,
        logo: row.get(5)?,
        created_by: parse_col(row, 6)?,
        created_at: row.get(7)?,
        total_votes: row.get(8)?,
    })
}

pub(crate) fn query_coin(conn: &Connection, id: Uuid) -> Result<Option<Coin>> {
    let sql = format!("SELECT {} FROM coins WHERE id = ?1", COIN_COLUMNS);
    conn.query_row(&sql, [id.to_string()], coin_row).optional()
}

impl Database {
    // -- Coins --

    /// `total_votes` always starts at zero; only the voting engine moves it.
    pub fn create_coin(&self, creator: Uuid, req: &CoinRequest) -> Result<Coin> {
        let coin = Coin {
            id: Uuid::new_v4(),
            name: req.name.clone(),
            symbol: req.symbol.clone(),
            description: req.description.clone(),
            category: req.category,
            logo: req.logo.clone(),
            created_by: creator,
            created_at: Utc::now(),
            total_votes: 0,
        };

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO coins (id, name, symbol, description, category, logo, created_by, created_at, total_votes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0)",
                params![
                    coin.id.to_string(),
                    coin.name,
                    coin.symbol,
                    coin.description,
                    coin.category.as_str(),
                    coin.logo,
                    coin.created_by.to_string(),
                    coin.created_at,
                ],
            )?;
            Ok(())
        })?;

        info!("Coin created: {} ({})", coin.name, coin.symbol);
        Ok(coin)
    }

    pub fn get_coin(&self, id: Uuid) -> Result<Option<Coin>> {
        self.with_conn(|conn| query_coin(conn, id))
    }

    pub fn list_coins(&self, filter: &CoinFilter, window: Window) -> Result<Listing<Coin>> {
        let mut clauses = Vec::new();
        let mut args = Vec::new();

        if let Some(category) = filter.category {
            args.push(Value::Text(category.as_str().to_string()));
            clauses.push(format!("category = ?{}", args.len()));
        }
        if let Some(term) = filter.search.as_deref().filter(|t| !t.is_empty()) {
            // SQLite's lower() only folds ASCII, so the term must match it.
            args.push(Value::Text(term.to_ascii_lowercase()));
            let n = args.len();
            clauses.push(format!(
                "(instr(lower(name), ?{n}) > 0 OR instr(lower(symbol), ?{n}) > 0)"
            ));
        }

        let from_where = if clauses.is_empty() {
            "FROM coins".to_string()
        } else {
            format!("FROM coins WHERE {}", clauses.join(" AND "))
        };

        self.with_conn(|conn| {
            let total = count_rows(conn, &from_where, &args)?;

            let mut args = args.clone();
            let limit = window_clause(window, &mut args);
            let sql = format!(
                "SELECT {} {} ORDER BY {}{}",
                COIN_COLUMNS,
                from_where,
                filter.ordering.sql(),
                limit
            );
            let mut stmt = conn.prepare(&sql)?;
            let items = stmt
                .query_map(params_from_iter(args.iter()), coin_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(Listing { items, total })
        })
    }

    /// Full replace of the editable fields. Creator and counter are untouched.
    pub fn update_coin(&self, id: Uuid, req: &CoinRequest) -> Result<Option<Coin>> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE coins SET name = ?2, symbol = ?3, description = ?4, category = ?5, logo = ?6
                 WHERE id = ?1",
                params![
                    id.to_string(),
                    req.name,
                    req.symbol,
                    req.description,
                    req.category.as_str(),
                    req.logo,
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_coin(conn, id)
        })
    }

    pub fn delete_coin(&self, id: Uuid) -> Result<bool> {
        let n = self.with_conn(|conn| Ok(conn.execute("DELETE FROM coins WHERE id = ?1", [id.to_string()])?))?;
        Ok(n > 0)
    }
}

#[cfg(test)]
mod tests {
    use memeplayers_types::api::AnalyticsRequest;
    use memeplayers_types::models::VoteDirection;

    use super::*;
    use crate::test_support::{coin, new_coin, user};

    #[test]
    fn create_coin_stamps_creator_and_zero_votes() {
        let db = Database::open_in_memory().unwrap();
        let owner = user(&db, "testuser");

        let coin = db.create_coin(owner.id, &new_coin("Test Coin", "TC")).unwrap();
        assert_eq!(coin.created_by, owner.id);
        assert_eq!(coin.total_votes, 0);

        let stored = db.get_coin(coin.id).unwrap().unwrap();
        assert_eq!(stored.name, "Test Coin");
        assert_eq!(stored.symbol, "TC");
    }

    #[test]
    fn list_filters_searches_and_orders() {
        let db = Database::open_in_memory().unwrap();
        let owner = user(&db, "owner");
        let voter = user(&db, "voter");
        let doge = coin(&db, &owner, "DOGE");
        let _pepe = coin(&db, &owner, "PEPE");
        let mut utility = new_coin("Chainlink", "LINK");
        utility.category = CoinCategory::Utility;
        db.create_coin(owner.id, &utility).unwrap();

        db.cast_vote(voter.id, doge.id, VoteDirection::Upvote).unwrap();

        let utilities = db
            .list_coins(
                &CoinFilter {
                    category: Some(CoinCategory::Utility),
                    ..Default::default()
                },
                Window::ALL,
            )
            .unwrap();
        assert_eq!(utilities.total, 1);
        assert_eq!(utilities.items[0].symbol, "LINK");

        let searched = db
            .list_coins(
                &CoinFilter {
                    search: Some("dog".into()),
                    ..Default::default()
                },
                Window::ALL,
            )
            .unwrap();
        assert_eq!(searched.total, 1);
        assert_eq!(searched.items[0].id, doge.id);

        let ordered = db
            .list_coins(
                &CoinFilter {
                    ordering: CoinOrdering::TotalVotesDesc,
                    ..Default::default()
                },
                Window { limit: 2, offset: 0 },
            )
            .unwrap();
        assert_eq!(ordered.total, 3);
        assert_eq!(ordered.items.len(), 2);
        assert_eq!(ordered.items[0].id, doge.id);
    }

    #[test]
    fn search_folds_case_like_sqlite() {
        let db = Database::open_in_memory().unwrap();
        let owner = user(&db, "owner");
        let ecole = db.create_coin(owner.id, &new_coin("École", "ECL")).unwrap();

        for term in ["É", "ÉCOLE", "cole"] {
            let found = db
                .list_coins(
                    &CoinFilter {
                        search: Some(term.into()),
                        ..Default::default()
                    },
                    Window::ALL,
                )
                .unwrap();
            assert_eq!(found.total, 1, "search {:?}", term);
            assert_eq!(found.items[0].id, ecole.id);
        }
    }

    #[test]
    fn update_keeps_creator_and_counter() {
        let db = Database::open_in_memory().unwrap();
        let owner = user(&db, "owner");
        let doge = coin(&db, &owner, "DOGE");
        db.cast_vote(owner.id, doge.id, VoteDirection::Upvote).unwrap();

        let updated = db.update_coin(doge.id, &new_coin("Dogecoin", "DOGE")).unwrap().unwrap();
        assert_eq!(updated.name, "Dogecoin");
        assert_eq!(updated.created_by, owner.id);
        assert_eq!(updated.total_votes, 1);
    }

    #[test]
    fn deleting_coin_removes_votes_and_analytics() {
        let db = Database::open_in_memory().unwrap();
        let owner = user(&db, "owner");
        let doge = coin(&db, &owner, "DOGE");
        db.cast_vote(owner.id, doge.id, VoteDirection::Upvote).unwrap();
        db.create_analytics(&AnalyticsRequest {
            coin: doge.id,
            views: 100,
            upvotes: 50,
            downvotes: 10,
            total_votes: 60,
        })
        .unwrap();

        assert!(db.delete_coin(doge.id).unwrap());

        let (votes, analytics): (i64, i64) = db
            .with_conn(|conn| {
                Ok(conn.query_row(
                    "SELECT (SELECT COUNT(*) FROM votes), (SELECT COUNT(*) FROM analytics)",
                    [],
                    |r| Ok((r.get(0)?, r.get(1)?)),
                )?)
            })
            .unwrap();
        assert_eq!(votes, 0);
        assert_eq!(analytics, 0);
        assert!(!db.delete_coin(doge.id).unwrap());
    }
}
