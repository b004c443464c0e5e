//! Voting engine.
//!
//! Every mutation of a vote row and the matching adjustment of
//! `coins.total_votes` happen in one IMMEDIATE transaction, so a coin's
//! counter is always the signed sum of its vote rows: +1 per upvote, -1 per
//! downvote. A user holds at most one vote per coin (UNIQUE(user_id, coin_id)).

use chrono::Utc;
use memeplayers_types::api::VoteOutcome;
use memeplayers_types::models::{Vote, VoteDirection};
use rusqlite::{Connection, params};
use tracing::{info, warn};
use uuid::Uuid;

use crate::queries::coins::query_coin;
use crate::queries::users::query_user;
use crate::queries::votes::{query_vote, query_vote_for};
use crate::{Database, DbError, Result};

/// A duplicate insert can only come from a writer outside this process; the
/// retry re-reads the slot and lands on the flip/retract path.
const MAX_CAST_ATTEMPTS: usize = 3;

/// Result of a vote mutation: what happened, the vote left in the slot (if
/// any) and the coin's counter after the change.
#[derive(Debug, Clone)]
pub struct VoteChange {
    pub outcome: VoteOutcome,
    pub vote: Option<Vote>,
    pub coin: Uuid,
    pub total_votes: i64,
}

/// Decide what a cast does given the slot's current direction, and by how
/// much it moves the coin's counter.
pub fn decide(existing: Option<VoteDirection>, requested: VoteDirection) -> (VoteOutcome, i64) {
    match existing {
        None => (VoteOutcome::Created, requested.weight()),
        Some(current) if current == requested => (VoteOutcome::Retracted, -current.weight()),
        Some(_) => (VoteOutcome::Flipped, 2 * requested.weight()),
    }
}

fn adjust_total(conn: &Connection, coin_id: Uuid, delta: i64) -> Result<i64> {
    let total = conn.query_row(
        "UPDATE coins SET total_votes = total_votes + ?2 WHERE id = ?1 RETURNING total_votes",
        params![coin_id.to_string(), delta],
        |r| r.get(0),
    )?;
    Ok(total)
}

fn cast_in(conn: &Connection, user_id: Uuid, coin_id: Uuid, requested: VoteDirection) -> Result<VoteChange> {
    if query_user(conn, user_id)?.is_none() {
        return Err(DbError::NotFound("user"));
    }
    if query_coin(conn, coin_id)?.is_none() {
        return Err(DbError::NotFound("coin"));
    }

    let existing = query_vote_for(conn, user_id, coin_id)?;
    let (outcome, delta) = decide(existing.as_ref().map(|v| v.vote_type), requested);

    let vote = match existing {
        None => {
            let vote = Vote {
                id: Uuid::new_v4(),
                user: user_id,
                coin: coin_id,
                vote_type: requested,
                created_at: Utc::now(),
            };
            conn.execute(
                "INSERT INTO votes (id, user_id, coin_id, vote_type, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    vote.id.to_string(),
                    user_id.to_string(),
                    coin_id.to_string(),
                    requested.as_str(),
                    vote.created_at,
                ],
            )?;
            Some(vote)
        }
        Some(old) if outcome == VoteOutcome::Retracted => {
            conn.execute("DELETE FROM votes WHERE id = ?1", [old.id.to_string()])?;
            None
        }
        Some(mut old) => {
            conn.execute(
                "UPDATE votes SET vote_type = ?2 WHERE id = ?1",
                params![old.id.to_string(), requested.as_str()],
            )?;
            old.vote_type = requested;
            Some(old)
        }
    };

    let total_votes = adjust_total(conn, coin_id, delta)?;

    Ok(VoteChange {
        outcome,
        vote,
        coin: coin_id,
        total_votes,
    })
}

/// Subtract every vote `user_id` holds from the affected coins' counters.
/// Called right before the user (and by cascade their votes) is deleted.
pub(crate) fn release_user_votes(conn: &Connection, user_id: Uuid) -> Result<usize> {
    let n = conn.execute(
        "UPDATE coins SET total_votes = total_votes - (
             SELECT CASE v.vote_type WHEN 'upvote' THEN 1 ELSE -1 END
             FROM votes v WHERE v.coin_id = coins.id AND v.user_id = ?1
         )
         WHERE id IN (SELECT coin_id FROM votes WHERE user_id = ?1)",
        [user_id.to_string()],
    )?;
    Ok(n)
}

impl Database {
    /// Cast a vote for `(user_id, coin_id)`:
    /// no vote yet creates one, the same direction retracts it, the opposite
    /// direction flips it.
    pub fn cast_vote(&self, user_id: Uuid, coin_id: Uuid, direction: VoteDirection) -> Result<VoteChange> {
        let mut attempt = 1;
        loop {
            match self.transaction(|tx| cast_in(tx, user_id, coin_id, direction)) {
                Err(DbError::Conflict(msg)) if attempt < MAX_CAST_ATTEMPTS => {
                    warn!(
                        "Vote slot race on user {} coin {} (attempt {}): {}",
                        user_id, coin_id, attempt, msg
                    );
                    attempt += 1;
                }
                Ok(change) => {
                    info!(
                        "Vote {:?}: coin {} by user {} ({}), total_votes={}",
                        change.outcome, coin_id, user_id, direction, change.total_votes
                    );
                    return Ok(change);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Remove a vote by id and undo its contribution.
    pub fn retract_vote(&self, vote_id: Uuid) -> Result<Option<VoteChange>> {
        let change = self.transaction(|tx| {
            let Some(vote) = query_vote(tx, vote_id)? else {
                return Ok(None);
            };
            tx.execute("DELETE FROM votes WHERE id = ?1", [vote_id.to_string()])?;
            let total_votes = adjust_total(tx, vote.coin, -vote.vote_type.weight())?;
            Ok(Some(VoteChange {
                outcome: VoteOutcome::Retracted,
                vote: None,
                coin: vote.coin,
                total_votes,
            }))
        })?;

        if let Some(ref c) = change {
            info!("Vote {} retracted, coin {} total_votes={}", vote_id, c.coin, c.total_votes);
        }
        Ok(change)
    }

    /// Point an existing vote at `direction`. A different direction flips it;
    /// the same direction leaves everything as it is (never retracts).
    pub fn set_vote_direction(&self, vote_id: Uuid, direction: VoteDirection) -> Result<Option<VoteChange>> {
        self.transaction(|tx| {
            let Some(mut vote) = query_vote(tx, vote_id)? else {
                return Ok(None);
            };

            if vote.vote_type == direction {
                let total_votes = query_coin(tx, vote.coin)?
                    .map(|c| c.total_votes)
                    .ok_or(DbError::NotFound("coin"))?;
                return Ok(Some(VoteChange {
                    outcome: VoteOutcome::Unchanged,
                    coin: vote.coin,
                    vote: Some(vote),
                    total_votes,
                }));
            }

            tx.execute(
                "UPDATE votes SET vote_type = ?2 WHERE id = ?1",
                params![vote_id.to_string(), direction.as_str()],
            )?;
            let total_votes = adjust_total(tx, vote.coin, 2 * direction.weight())?;
            vote.vote_type = direction;
            info!("Vote {} flipped to {}, total_votes={}", vote_id, direction, total_votes);

            Ok(Some(VoteChange {
                outcome: VoteOutcome::Flipped,
                coin: vote.coin,
                vote: Some(vote),
                total_votes,
            }))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::test_support::{coin, user};

    use memeplayers_types::models::VoteDirection::{Downvote, Upvote};

    fn total(db: &Database, coin_id: Uuid) -> i64 {
        db.get_coin(coin_id).unwrap().unwrap().total_votes
    }

    fn vote_rows(db: &Database, coin_id: Uuid) -> i64 {
        db.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM votes WHERE coin_id = ?1",
                [coin_id.to_string()],
                |r| r.get(0),
            )?)
        })
        .unwrap()
    }

    /// Sum of vote weights actually stored for the coin.
    fn stored_sum(db: &Database, coin_id: Uuid) -> i64 {
        db.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT COALESCE(SUM(CASE vote_type WHEN 'upvote' THEN 1 ELSE -1 END), 0)
                 FROM votes WHERE coin_id = ?1",
                [coin_id.to_string()],
                |r| r.get(0),
            )?)
        })
        .unwrap()
    }

    #[test]
    fn decide_covers_every_transition() {
        assert_eq!(decide(None, Upvote), (VoteOutcome::Created, 1));
        assert_eq!(decide(None, Downvote), (VoteOutcome::Created, -1));
        assert_eq!(decide(Some(Upvote), Upvote), (VoteOutcome::Retracted, -1));
        assert_eq!(decide(Some(Downvote), Downvote), (VoteOutcome::Retracted, 1));
        assert_eq!(decide(Some(Downvote), Upvote), (VoteOutcome::Flipped, 2));
        assert_eq!(decide(Some(Upvote), Downvote), (VoteOutcome::Flipped, -2));
    }

    #[test]
    fn same_direction_twice_is_a_retraction() {
        let db = Database::open_in_memory().unwrap();
        let u = user(&db, "alice");
        let c = coin(&db, &u, "DOGE");

        let first = db.cast_vote(u.id, c.id, Upvote).unwrap();
        assert_eq!(first.outcome, VoteOutcome::Created);
        assert_eq!(first.total_votes, 1);

        let second = db.cast_vote(u.id, c.id, Upvote).unwrap();
        assert_eq!(second.outcome, VoteOutcome::Retracted);
        assert!(second.vote.is_none());
        assert_eq!(total(&db, c.id), 0);
        assert!(db.get_vote_for(u.id, c.id).unwrap().is_none());
    }

    #[test]
    fn opposite_direction_flips_by_two() {
        let db = Database::open_in_memory().unwrap();
        let u = user(&db, "alice");
        let c = coin(&db, &u, "DOGE");

        db.cast_vote(u.id, c.id, Upvote).unwrap();
        let flipped = db.cast_vote(u.id, c.id, Downvote).unwrap();

        assert_eq!(flipped.outcome, VoteOutcome::Flipped);
        assert_eq!(flipped.total_votes, -1);
        assert_eq!(vote_rows(&db, c.id), 1);
        let vote = db.get_vote_for(u.id, c.id).unwrap().unwrap();
        assert_eq!(vote.vote_type, Downvote);
    }

    #[test]
    fn two_user_scenario() {
        let db = Database::open_in_memory().unwrap();
        let a = user(&db, "a");
        let b = user(&db, "b");
        let doge = coin(&db, &a, "DOGE");
        assert_eq!(doge.total_votes, 0);

        assert_eq!(db.cast_vote(a.id, doge.id, Upvote).unwrap().total_votes, 1);
        assert_eq!(db.cast_vote(b.id, doge.id, Downvote).unwrap().total_votes, 0);
        assert_eq!(db.cast_vote(a.id, doge.id, Downvote).unwrap().total_votes, -2);
        assert_eq!(db.cast_vote(a.id, doge.id, Downvote).unwrap().total_votes, -1);

        assert_eq!(vote_rows(&db, doge.id), 1);
        assert_eq!(stored_sum(&db, doge.id), total(&db, doge.id));
    }

    #[test]
    fn unknown_user_or_coin_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let u = user(&db, "alice");
        let c = coin(&db, &u, "DOGE");

        let err = db.cast_vote(Uuid::new_v4(), c.id, Upvote).unwrap_err();
        assert!(matches!(err, DbError::NotFound("user")));
        let err = db.cast_vote(u.id, Uuid::new_v4(), Upvote).unwrap_err();
        assert!(matches!(err, DbError::NotFound("coin")));
        assert_eq!(total(&db, c.id), 0);
    }

    #[test]
    fn retract_by_id_undoes_contribution() {
        let db = Database::open_in_memory().unwrap();
        let u = user(&db, "alice");
        let c = coin(&db, &u, "DOGE");
        let vote = db.cast_vote(u.id, c.id, Downvote).unwrap().vote.unwrap();
        assert_eq!(total(&db, c.id), -1);

        let change = db.retract_vote(vote.id).unwrap().unwrap();
        assert_eq!(change.total_votes, 0);
        assert!(db.get_vote(vote.id).unwrap().is_none());
        assert!(db.retract_vote(vote.id).unwrap().is_none());
    }

    #[test]
    fn set_direction_flips_but_never_retracts() {
        let db = Database::open_in_memory().unwrap();
        let u = user(&db, "alice");
        let c = coin(&db, &u, "DOGE");
        let vote = db.cast_vote(u.id, c.id, Upvote).unwrap().vote.unwrap();

        let same = db.set_vote_direction(vote.id, Upvote).unwrap().unwrap();
        assert_eq!(same.outcome, VoteOutcome::Unchanged);
        assert_eq!(same.total_votes, 1);
        assert!(same.vote.is_some());

        let flipped = db.set_vote_direction(vote.id, Downvote).unwrap().unwrap();
        assert_eq!(flipped.outcome, VoteOutcome::Flipped);
        assert_eq!(flipped.total_votes, -1);
        assert_eq!(stored_sum(&db, c.id), -1);
    }

    #[test]
    fn deleting_voter_releases_their_votes() {
        let db = Database::open_in_memory().unwrap();
        let owner = user(&db, "owner");
        let up = user(&db, "up");
        let down = user(&db, "down");
        let doge = coin(&db, &owner, "DOGE");
        let pepe = coin(&db, &owner, "PEPE");

        db.cast_vote(up.id, doge.id, Upvote).unwrap();
        db.cast_vote(up.id, pepe.id, Upvote).unwrap();
        db.cast_vote(down.id, doge.id, Downvote).unwrap();
        assert_eq!(total(&db, doge.id), 0);

        assert!(db.delete_user(up.id).unwrap());
        assert_eq!(total(&db, doge.id), -1);
        assert_eq!(total(&db, pepe.id), 0);
        assert_eq!(stored_sum(&db, doge.id), -1);
    }

    #[test]
    fn concurrent_casts_keep_counter_consistent() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let u = user(&db, "alice");
        let c = coin(&db, &u, "DOGE");
        let (uid, cid) = (u.id, c.id);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let db = db.clone();
                thread::spawn(move || db.cast_vote(uid, cid, Upvote).unwrap())
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        // Eight toggles land back on "no vote".
        assert_eq!(vote_rows(&db, c.id), 0);
        assert_eq!(total(&db, c.id), 0);
    }
}
