use std::collections::HashMap;

use color_eyre::eyre::{
    Result,
    WrapErr,
};
use serde::Deserialize;

/// The four fixed tabs partitioning a user's bets.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum BetCategory {
    BetsTaken,
    BetsDone,
    BetsWinner,
    #[default]
    BetsGave,
}

impl BetCategory {
    pub const ALL: [BetCategory; 4] = [
        BetCategory::BetsTaken,
        BetCategory::BetsDone,
        BetCategory::BetsWinner,
        BetCategory::BetsGave,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            BetCategory::BetsTaken => "betstaken",
            BetCategory::BetsDone => "betsdone",
            BetCategory::BetsWinner => "betsWinner",
            BetCategory::BetsGave => "betsgave",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BetCategory::BetsTaken => "Bets Taken",
            BetCategory::BetsDone => "Bets Done",
            BetCategory::BetsWinner => "Bets Winner",
            BetCategory::BetsGave => "Bets Gave",
        }
    }

    pub fn index(&self) -> usize {
        Self::ALL
            .iter()
            .position(|category| category == self)
            .unwrap_or_default()
    }

    pub fn next(&self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(&self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Bet {
    pub id: String,
    pub title: String,
    pub amount: f64,
    pub status: String,
}

/// Profile as loaded from `/user/me`. Replaced wholesale on reload, never
/// patched in place.
#[derive(Clone, Debug, PartialEq)]
pub struct UserProfile {
    pub username: String,
    pub email: String,
    pub balance: f64,
    bets: HashMap<BetCategory, Vec<Bet>>,
}

impl UserProfile {
    pub fn from_me_payload(bytes: &[u8]) -> Result<Self> {
        let dto: MeResponseDto =
            serde_json::from_slice(bytes).wrap_err("malformed profile payload")?;
        Ok(dto.user.into())
    }

    /// Bets for one tab. An absent category reads the same as an empty one.
    pub fn bets_for(&self, category: BetCategory) -> &[Bet] {
        self.bets
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

#[derive(Deserialize)]
struct MeResponseDto {
    user: UserProfileDto,
}

#[derive(Deserialize)]
struct UserProfileDto {
    username: String,
    email: String,
    balance: f64,
    #[serde(default)]
    bets: BetListsDto,
}

#[derive(Default, Deserialize)]
struct BetListsDto {
    #[serde(default)]
    betstaken: Vec<BetDto>,
    #[serde(default)]
    betsdone: Vec<BetDto>,
    #[serde(rename = "betsWinner", default)]
    bets_winner: Vec<BetDto>,
    #[serde(default)]
    betsgave: Vec<BetDto>,
}

#[derive(Deserialize)]
struct BetDto {
    #[serde(rename = "_id")]
    id: String,
    title: String,
    amount: f64,
    status: String,
}

impl From<UserProfileDto> for UserProfile {
    fn from(dto: UserProfileDto) -> Self {
        let lists = dto.bets;
        let into_bets =
            |bets: Vec<BetDto>| bets.into_iter().map(Into::into).collect::<Vec<Bet>>();
        let bets = HashMap::from([
            (BetCategory::BetsTaken, into_bets(lists.betstaken)),
            (BetCategory::BetsDone, into_bets(lists.betsdone)),
            (BetCategory::BetsWinner, into_bets(lists.bets_winner)),
            (BetCategory::BetsGave, into_bets(lists.betsgave)),
        ]);
        UserProfile {
            username: dto.username,
            email: dto.email,
            balance: dto.balance,
            bets,
        }
    }
}

impl From<BetDto> for Bet {
    fn from(dto: BetDto) -> Self {
        Bet {
            id: dto.id,
            title: dto.title,
            amount: dto.amount,
            status: dto.status,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn payload_bytes(value: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[test]
    fn from_me_payload__parses_profile_and_categorized_bets() {
        // given
        let payload = payload_bytes(json!({
            "user": {
                "username": "a",
                "email": "a@x.com",
                "balance": 100,
                "bets": {
                    "betsgave": [
                        {"_id": "1", "title": "T", "amount": 50, "status": "open"}
                    ]
                }
            }
        }));

        // when
        let profile = UserProfile::from_me_payload(&payload).unwrap();

        // then
        assert_eq!(profile.username, "a");
        assert_eq!(profile.email, "a@x.com");
        assert_eq!(profile.balance, 100.0);
        let gave = profile.bets_for(BetCategory::BetsGave);
        assert_eq!(gave.len(), 1);
        assert_eq!(gave[0].id, "1");
        assert_eq!(gave[0].title, "T");
        assert_eq!(gave[0].amount, 50.0);
        assert_eq!(gave[0].status, "open");
        assert!(profile.bets_for(BetCategory::BetsTaken).is_empty());
    }

    #[test]
    fn from_me_payload__tolerates_fully_absent_bets_mapping() {
        let payload = payload_bytes(json!({
            "user": {"username": "a", "email": "a@x.com", "balance": 0}
        }));

        let profile = UserProfile::from_me_payload(&payload).unwrap();

        for category in BetCategory::ALL {
            assert!(profile.bets_for(category).is_empty());
        }
    }

    #[test]
    fn from_me_payload__rejects_payload_missing_identity_fields() {
        let missing_username = payload_bytes(json!({
            "user": {"email": "a@x.com", "balance": 1}
        }));
        let missing_email = payload_bytes(json!({
            "user": {"username": "a", "balance": 1}
        }));
        let missing_balance = payload_bytes(json!({
            "user": {"username": "a", "email": "a@x.com"}
        }));

        assert!(UserProfile::from_me_payload(&missing_username).is_err());
        assert!(UserProfile::from_me_payload(&missing_email).is_err());
        assert!(UserProfile::from_me_payload(&missing_balance).is_err());
    }

    #[test]
    fn bets_for__returns_exact_sequence_per_category() {
        let payload = payload_bytes(json!({
            "user": {
                "username": "a",
                "email": "a@x.com",
                "balance": 5,
                "bets": {
                    "betstaken": [
                        {"_id": "t1", "title": "Taken", "amount": 1, "status": "open"}
                    ],
                    "betsWinner": [
                        {"_id": "w1", "title": "Won A", "amount": 2, "status": "won"},
                        {"_id": "w2", "title": "Won B", "amount": 3, "status": "won"}
                    ]
                }
            }
        }));

        let profile = UserProfile::from_me_payload(&payload).unwrap();

        let winners: Vec<&str> = profile
            .bets_for(BetCategory::BetsWinner)
            .iter()
            .map(|bet| bet.id.as_str())
            .collect();
        assert_eq!(winners, vec!["w1", "w2"]);
        assert_eq!(profile.bets_for(BetCategory::BetsTaken).len(), 1);
        assert!(profile.bets_for(BetCategory::BetsDone).is_empty());
        assert!(profile.bets_for(BetCategory::BetsGave).is_empty());
    }

    #[test]
    fn category__keys_and_default_match_backend_contract() {
        let keys: Vec<&str> = BetCategory::ALL.iter().map(|c| c.key()).collect();
        assert_eq!(keys, vec!["betstaken", "betsdone", "betsWinner", "betsgave"]);
        assert_eq!(BetCategory::default(), BetCategory::BetsGave);
    }

    #[test]
    fn category__next_and_prev_cycle_through_all_tabs() {
        let mut category = BetCategory::default();
        for _ in 0..BetCategory::ALL.len() {
            category = category.next();
        }
        assert_eq!(category, BetCategory::default());
        assert_eq!(BetCategory::BetsTaken.prev(), BetCategory::BetsGave);
        assert_eq!(BetCategory::BetsGave.next(), BetCategory::BetsTaken);
    }

    proptest! {
        #[test]
        fn bets_for__total_over_any_subset_of_categories(
            present in proptest::collection::vec(any::<bool>(), 4),
            counts in proptest::collection::vec(0usize..5, 4),
        ) {
            let mut lists = serde_json::Map::new();
            for (i, category) in BetCategory::ALL.iter().enumerate() {
                if present[i] {
                    let bets: Vec<serde_json::Value> = (0..counts[i])
                        .map(|n| json!({
                            "_id": format!("{}-{}", category.key(), n),
                            "title": "bet",
                            "amount": n as f64,
                            "status": "open"
                        }))
                        .collect();
                    lists.insert(category.key().to_string(), json!(bets));
                }
            }
            let payload = payload_bytes(json!({
                "user": {
                    "username": "a",
                    "email": "a@x.com",
                    "balance": 0,
                    "bets": lists
                }
            }));

            let profile = UserProfile::from_me_payload(&payload).unwrap();

            for (i, category) in BetCategory::ALL.iter().enumerate() {
                let expected = if present[i] { counts[i] } else { 0 };
                prop_assert_eq!(profile.bets_for(*category).len(), expected);
            }
        }
    }
}
