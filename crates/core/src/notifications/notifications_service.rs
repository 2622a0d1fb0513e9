use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, error, info, warn};
use serde_json::Value;

use super::notifications_model::{
    default_template_data, CohortDispatch, CohortPartition, DispatchOutcome, NotificationReport,
    Winner, WinnerCohort, WinnerTemplates,
};
use super::notifications_traits::WinnerNotifierTrait;
use crate::donations::DonationRepositoryTrait;
use crate::errors::{Error, Result, ValidationError};
use crate::games::{Game, GameRepositoryTrait};
use crate::mailing::{send_bulk_templated_email, BulkDestination, BulkEmailClient};
use crate::users::{User, UserRepositoryTrait};

/// Selects a game's winning tile and emails the winning donors.
pub struct WinnerNotifier {
    game_repository: Arc<dyn GameRepositoryTrait>,
    donation_repository: Arc<dyn DonationRepositoryTrait>,
    user_repository: Arc<dyn UserRepositoryTrait>,
    mail_client: Arc<dyn BulkEmailClient>,
    templates: WinnerTemplates,
}

impl WinnerNotifier {
    pub fn new(
        game_repository: Arc<dyn GameRepositoryTrait>,
        donation_repository: Arc<dyn DonationRepositoryTrait>,
        user_repository: Arc<dyn UserRepositoryTrait>,
        mail_client: Arc<dyn BulkEmailClient>,
    ) -> Self {
        Self {
            game_repository,
            donation_repository,
            user_repository,
            mail_client,
            templates: WinnerTemplates::default(),
        }
    }

    pub fn with_templates(mut self, templates: WinnerTemplates) -> Self {
        self.templates = templates;
        self
    }

    fn load_game(&self, game_id: &str) -> Result<Game> {
        self.game_repository
            .get_game(game_id)?
            .ok_or_else(|| Error::NotFound(format!("Game {}", game_id)))
    }

    /// Joins each donation holding `tile` with its donor.
    fn resolve_winners(&self, game: &Game, tile: i32) -> Result<Vec<Winner>> {
        let donations: Vec<_> = self
            .donation_repository
            .find_donations_by_game_and_tile(&game.id, tile)?
            .into_iter()
            .filter(|d| d.has_tile(tile))
            .collect();

        let user_ids: Vec<String> = {
            let mut seen = HashSet::new();
            donations
                .iter()
                .filter(|d| seen.insert(d.user_id.as_str()))
                .map(|d| d.user_id.clone())
                .collect()
        };
        let users: HashMap<String, User> = self
            .user_repository
            .get_users_by_ids(&user_ids)?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        Ok(donations
            .into_iter()
            .filter_map(|donation| match users.get(&donation.user_id) {
                Some(user) => Some(Winner {
                    donation,
                    user: user.clone(),
                }),
                None => {
                    warn!(
                        "Donation {} on game {} holds the winning tile but user {} no longer exists",
                        donation.id, game.id, donation.user_id
                    );
                    None
                }
            })
            .collect())
    }

    async fn dispatch_cohort(
        &self,
        game: &Game,
        cohort: WinnerCohort,
        winners: &[Winner],
        default_data: &Value,
    ) -> Option<CohortDispatch> {
        if winners.is_empty() {
            return None;
        }
        let template = self.templates.template_for(cohort);
        let destinations: Vec<BulkDestination> = winners
            .iter()
            .map(|w| BulkDestination::new(w.user.email.clone(), w.template_data(game)))
            .collect();

        let outcome = match send_bulk_templated_email(
            self.mail_client.as_ref(),
            &destinations,
            template,
            default_data,
        )
        .await
        {
            Ok(summary) => {
                debug!(
                    "Sent '{}' to {} {} winner(s) of game {}",
                    template, summary.recipients, cohort, game.id
                );
                DispatchOutcome::Sent {
                    batches: summary.batches,
                }
            }
            Err(err) => {
                error!(
                    "Failed to email {} winner(s) of game {}: {}",
                    cohort, game.id, err
                );
                DispatchOutcome::Failed {
                    total_batches: err.total_batches,
                    failed_batches: err.failed_batches(),
                    failed_recipients: err.failed_recipients(),
                    error: err.to_string(),
                }
            }
        };

        Some(CohortDispatch {
            cohort,
            template: template.to_string(),
            recipients: destinations.len(),
            outcome,
        })
    }

    /// Emails every winner of `game`, both cohorts at once.
    async fn notify(&self, game: &Game, tile: i32) -> Result<NotificationReport> {
        let partition = CohortPartition::from_winners(self.resolve_winners(game, tile)?);
        info!(
            "Game {} tile {}: {} winner(s), {} ready, {} without a full address",
            game.id,
            tile,
            partition.len(),
            partition.ready.len(),
            partition.needs_location.len()
        );

        let default_data = default_template_data();
        let (ready, needs_location) = futures::join!(
            self.dispatch_cohort(game, WinnerCohort::Ready, &partition.ready, &default_data),
            self.dispatch_cohort(
                game,
                WinnerCohort::NeedsLocation,
                &partition.needs_location,
                &default_data
            ),
        );

        let report = NotificationReport {
            game_id: game.id.clone(),
            winning_tile: tile,
            winners: partition.len(),
            dispatches: ready.into_iter().chain(needs_location).collect(),
        };
        if let Some(failure) = report.failure() {
            error!("{}", failure);
        }
        Ok(report)
    }
}

#[async_trait]
impl WinnerNotifierTrait for WinnerNotifier {
    fn get_game_winners(&self, game_id: &str) -> Result<Vec<Winner>> {
        let game = self.load_game(game_id)?;
        let tile = game
            .winning_tile
            .ok_or_else(|| Error::NotFound(format!("Winning tile of game {}", game_id)))?;
        self.resolve_winners(&game, tile)
    }

    async fn finalize_winning_tile(&self, game_id: &str, tile: i32) -> Result<Game> {
        let game = self.load_game(game_id)?;
        if !game.has_tile(tile) {
            return Err(ValidationError::TileNotOnBoard {
                game_id: game.id,
                tile,
            }
            .into());
        }
        if game.winning_tile.is_some() {
            return Err(Error::AlreadyFinalized(game.id));
        }

        // The read above is only a shortcut; the conditional write decides.
        match self
            .game_repository
            .set_winning_tile_if_unset(game_id, tile, Utc::now())
            .await?
        {
            Some(game) => {
                info!("Game {} finalized with winning tile {}", game.id, tile);
                Ok(game)
            }
            None => Err(Error::AlreadyFinalized(game_id.to_string())),
        }
    }

    async fn notify_winners(&self, game_id: &str) -> Result<NotificationReport> {
        let game = self.load_game(game_id)?;
        let tile = game
            .winning_tile
            .ok_or_else(|| Error::NotFound(format!("Winning tile of game {}", game_id)))?;
        self.notify(&game, tile).await
    }

    async fn set_winning_tile_and_notify(
        &self,
        game_id: &str,
        tile: i32,
    ) -> Result<NotificationReport> {
        let game = self.finalize_winning_tile(game_id, tile).await?;
        self.notify(&game, tile).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{WINNER_NEEDS_LOCATION_TEMPLATE, WINNER_TEMPLATE};
    use crate::donations::{Donation, NewDonation};
    use crate::memory::{
        InMemoryDonationRepository, InMemoryGameRepository, InMemoryUserRepository,
        RecordingEmailClient,
    };
    use crate::users::Location;
    use chrono::Duration;

    struct Fixture {
        notifier: Arc<WinnerNotifier>,
        games: Arc<InMemoryGameRepository>,
        donations: Arc<InMemoryDonationRepository>,
        users: Arc<InMemoryUserRepository>,
        mail: Arc<RecordingEmailClient>,
    }

    fn fixture() -> Fixture {
        let games = Arc::new(InMemoryGameRepository::new());
        let donations = Arc::new(InMemoryDonationRepository::new());
        let users = Arc::new(InMemoryUserRepository::new());
        let mail = Arc::new(RecordingEmailClient::new());
        let notifier = Arc::new(WinnerNotifier::new(
            games.clone(),
            donations.clone(),
            users.clone(),
            mail.clone(),
        ));
        Fixture {
            notifier,
            games,
            donations,
            users,
            mail,
        }
    }

    fn game(id: &str) -> Game {
        let now = Utc::now();
        Game {
            id: id.to_string(),
            name: "Spring Chip Drop".to_string(),
            organization_ids: vec!["org1".to_string()],
            start_time: now - Duration::hours(1),
            end_time: now + Duration::hours(2),
            winning_tile: None,
            board: (1..=36).collect(),
            price: 100,
            stream_url: None,
        }
    }

    fn location() -> Location {
        Location {
            address: Some("12 Pasture Rd".to_string()),
            city: Some("Ames".to_string()),
            state: Some("IA".to_string()),
            zip: Some("50010".to_string()),
        }
    }

    impl Fixture {
        fn add_user(&self, id: &str, location: Option<Location>) {
            self.users
                .put(User {
                    id: id.to_string(),
                    name: format!("Donor {}", id),
                    email: format!("{}@example.org", id),
                    phone: None,
                    location,
                })
                .unwrap();
        }

        async fn add_donation(&self, game_id: &str, user_id: &str, tiles: Vec<i32>) -> Donation {
            self.donations
                .insert_new_donation(NewDonation {
                    id: None,
                    amount: 100 * tiles.len() as i64,
                    user_id: user_id.to_string(),
                    organization_id: "org1".to_string(),
                    game_id: Some(game_id.to_string()),
                    transaction_id: format!("txn-{}", user_id),
                    date: Utc::now(),
                    tiles,
                })
                .await
                .unwrap()
        }
    }

    async fn three_winners() -> Fixture {
        let f = fixture();
        f.games.put(game("g1")).unwrap();
        let mut no_zip = location();
        no_zip.zip = Some("  ".to_string());
        f.add_user("u1", Some(location()));
        f.add_user("u2", Some(location()));
        f.add_user("u3", Some(no_zip));
        f.add_user("u4", Some(location()));
        f.add_donation("g1", "u1", vec![7, 8]).await;
        f.add_donation("g1", "u2", vec![7]).await;
        f.add_donation("g1", "u3", vec![3, 7]).await;
        f.add_donation("g1", "u4", vec![8, 9]).await;
        f
    }

    #[tokio::test]
    async fn test_winners_are_split_into_two_templates() {
        let f = three_winners().await;

        let report = f.notifier.set_winning_tile_and_notify("g1", 7).await.unwrap();

        assert!(report.is_complete());
        assert_eq!(report.winners, 3);

        let ready = f.mail.calls_for_template(WINNER_TEMPLATE);
        assert_eq!(ready.len(), 1);
        let mut ready_to: Vec<String> = ready[0]
            .destinations
            .iter()
            .map(|d| d.to_address.clone())
            .collect();
        ready_to.sort();
        assert_eq!(ready_to, vec!["u1@example.org", "u2@example.org"]);

        let needs = f.mail.calls_for_template(WINNER_NEEDS_LOCATION_TEMPLATE);
        assert_eq!(needs.len(), 1);
        assert_eq!(needs[0].destinations.len(), 1);
        assert_eq!(needs[0].destinations[0].to_address, "u3@example.org");
        assert_eq!(needs[0].destinations[0].template_data["winningTile"], 7);
    }

    #[tokio::test]
    async fn test_finalize_moves_end_time_back() {
        let f = three_winners().await;
        let before = Utc::now();

        let game = f.notifier.finalize_winning_tile("g1", 7).await.unwrap();

        assert_eq!(game.winning_tile, Some(7));
        assert!(game.end_time >= before && game.end_time <= Utc::now());
    }

    #[tokio::test]
    async fn test_finalize_keeps_past_end_time() {
        let f = fixture();
        let mut ended = game("g1");
        ended.end_time = Utc::now() - Duration::minutes(30);
        f.games.put(ended.clone()).unwrap();

        let game = f.notifier.finalize_winning_tile("g1", 5).await.unwrap();
        assert_eq!(game.end_time, ended.end_time);
    }

    #[tokio::test]
    async fn test_second_finalize_is_rejected_without_sending() {
        let f = three_winners().await;
        f.notifier.set_winning_tile_and_notify("g1", 7).await.unwrap();
        let sent = f.mail.calls().len();

        let result = f.notifier.set_winning_tile_and_notify("g1", 8).await;

        assert!(matches!(result, Err(Error::AlreadyFinalized(_))));
        assert_eq!(f.mail.calls().len(), sent);
        let stored = f.games.get_game("g1").unwrap().unwrap();
        assert_eq!(stored.winning_tile, Some(7));
    }

    #[tokio::test]
    async fn test_concurrent_finalize_has_one_winner() {
        let f = three_winners().await;

        let handles: Vec<_> = (1..=8)
            .map(|tile| {
                let notifier = f.notifier.clone();
                tokio::spawn(async move { notifier.finalize_winning_tile("g1", tile).await })
            })
            .collect();
        let mut ok = 0;
        let mut rejected = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => ok += 1,
                Err(Error::AlreadyFinalized(_)) => rejected += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(rejected, 7);
    }

    #[tokio::test]
    async fn test_tile_off_the_board_changes_nothing() {
        let f = three_winners().await;

        let result = f.notifier.finalize_winning_tile("g1", 40).await;

        assert!(matches!(
            result,
            Err(Error::Validation(ValidationError::TileNotOnBoard { tile: 40, .. }))
        ));
        assert_eq!(f.games.get_game("g1").unwrap().unwrap().winning_tile, None);
    }

    #[tokio::test]
    async fn test_unknown_game_is_not_found() {
        let f = fixture();
        let result = f.notifier.set_winning_tile_and_notify("nope", 1).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_no_winners_sends_nothing() {
        let f = three_winners().await;

        let report = f.notifier.set_winning_tile_and_notify("g1", 30).await.unwrap();

        assert_eq!(report.winners, 0);
        assert!(report.dispatches.is_empty());
        assert!(f.mail.calls().is_empty());
        assert_eq!(f.games.get_game("g1").unwrap().unwrap().winning_tile, Some(30));
    }

    #[tokio::test]
    async fn test_one_failing_cohort_does_not_block_the_other() {
        let f = three_winners().await;
        f.mail.fail_template(WINNER_NEEDS_LOCATION_TEMPLATE);

        let report = f.notifier.set_winning_tile_and_notify("g1", 7).await.unwrap();

        assert!(!report.is_complete());
        assert!(report.dispatch_for(WinnerCohort::Ready).unwrap().is_sent());
        let failure = report.failure().unwrap();
        assert_eq!(failure.failed_cohorts, vec![WinnerCohort::NeedsLocation]);
        assert_eq!(failure.failed_recipients, 1);

        let mut delivered = f.mail.delivered_recipients();
        delivered.sort();
        assert_eq!(delivered, vec!["u1@example.org", "u2@example.org"]);
        assert_eq!(f.games.get_game("g1").unwrap().unwrap().winning_tile, Some(7));
    }

    #[tokio::test]
    async fn test_retry_after_partial_failure() {
        let f = three_winners().await;
        f.mail.fail_template(WINNER_TEMPLATE);
        let first = f.notifier.set_winning_tile_and_notify("g1", 7).await.unwrap();
        assert!(!first.is_complete());

        f.mail.clear_failures();
        let retry = f.notifier.notify_winners("g1").await.unwrap();

        assert!(retry.is_complete());
        assert_eq!(retry.winning_tile, 7);
        assert_eq!(f.mail.calls_for_template(WINNER_TEMPLATE).len(), 2);
    }

    #[tokio::test]
    async fn test_notify_before_finalize_is_not_found() {
        let f = three_winners().await;
        let result = f.notifier.notify_winners("g1").await;
        assert!(matches!(result, Err(Error::NotFound(_))));
        assert!(f.mail.calls().is_empty());
    }

    #[tokio::test]
    async fn test_get_game_winners() {
        let f = three_winners().await;
        assert!(matches!(
            f.notifier.get_game_winners("g1"),
            Err(Error::NotFound(_))
        ));

        f.notifier.finalize_winning_tile("g1", 8).await.unwrap();
        let mut winners: Vec<String> = f
            .notifier
            .get_game_winners("g1")
            .unwrap()
            .into_iter()
            .map(|w| w.user.id)
            .collect();
        winners.sort();
        assert_eq!(winners, vec!["u1", "u4"]);
    }

    #[tokio::test]
    async fn test_donation_of_missing_user_is_skipped() {
        let f = three_winners().await;
        f.add_donation("g1", "ghost", vec![7]).await;

        let report = f.notifier.set_winning_tile_and_notify("g1", 7).await.unwrap();
        assert_eq!(report.winners, 3);
    }

    #[tokio::test]
    async fn test_donations_on_other_games_do_not_win() {
        let f = three_winners().await;
        f.games.put(game("g2")).unwrap();
        f.add_user("u9", Some(location()));
        f.add_donation("g2", "u9", vec![7]).await;

        let report = f.notifier.set_winning_tile_and_notify("g1", 7).await.unwrap();
        assert_eq!(report.winners, 3);
        assert!(!f
            .mail
            .delivered_recipients()
            .contains(&"u9@example.org".to_string()));
    }

    #[tokio::test]
    async fn test_custom_templates() {
        let f = three_winners().await;
        let notifier = WinnerNotifier::new(
            f.games.clone(),
            f.donations.clone(),
            f.users.clone(),
            f.mail.clone(),
        )
        .with_templates(WinnerTemplates {
            ready: "fall-winner".to_string(),
            needs_location: "fall-winner-address".to_string(),
        });

        notifier.set_winning_tile_and_notify("g1", 7).await.unwrap();
        assert_eq!(f.mail.calls_for_template("fall-winner").len(), 1);
        assert_eq!(f.mail.calls_for_template("fall-winner-address").len(), 1);
    }
}
