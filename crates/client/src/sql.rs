//! SQL text for the three table operations.

use rand::seq::SliceRandom;
use rand::Rng;

pub const PLANETS: [&str; 8] = [
    "Mercury", "Venus", "Earth", "Mars", "Jupiter", "Saturn", "Uranus", "Neptune",
];

pub fn random_planet<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    PLANETS.choose(rng).copied().unwrap_or("Earth")
}

/// DDL for a tamper-proof, immutable, publicly readable table.
///
/// `public_key` is the capability root key; the server checks later
/// tokens against it.
pub fn create_table_sql(resource_id: &str, public_key: &str) -> String {
    format!(
        "CREATE TABLE {resource_id} (PROOF_ORDER BIGINT PRIMARY KEY, PLANET VARCHAR) \
         WITH \"public_key={public_key},access_type=public_read,tamperproof=true,immutable=true,persist_interval=10\""
    )
}

pub fn insert_row_sql(resource_id: &str, proof_order: i64, planet: &str) -> String {
    format!(
        "INSERT INTO {resource_id} (PROOF_ORDER, PLANET) VALUES ({proof_order}, '{}');",
        planet.replace('\'', "''")
    )
}

pub fn select_all_sql(resource_id: &str) -> String {
    format!("SELECT * FROM {resource_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_table_sql() {
        let sql = create_table_sql("se_playground.orbit", "abcd1234");
        assert!(sql.starts_with("CREATE TABLE se_playground.orbit (PROOF_ORDER BIGINT PRIMARY KEY, PLANET VARCHAR) WITH \""));
        assert!(sql.contains("public_key=abcd1234,"));
        assert!(sql.contains("tamperproof=true"));
        assert!(sql.contains("immutable=true"));
        assert!(sql.ends_with("persist_interval=10\""));
    }

    #[test]
    fn test_insert_row_sql() {
        assert_eq!(
            insert_row_sql("se_playground.orbit", 0, "Mars"),
            "INSERT INTO se_playground.orbit (PROOF_ORDER, PLANET) VALUES (0, 'Mars');"
        );
    }

    #[test]
    fn test_insert_row_sql_escapes_quotes() {
        let sql = insert_row_sql("s.t", 1, "O'Neill");
        assert!(sql.ends_with("VALUES (1, 'O''Neill');"));
    }

    #[test]
    fn test_select_all_sql() {
        assert_eq!(select_all_sql("s.t"), "SELECT * FROM s.t");
    }

    #[test]
    fn test_random_planet_is_known() {
        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            assert!(PLANETS.contains(&random_planet(&mut rng)));
        }
    }
}
