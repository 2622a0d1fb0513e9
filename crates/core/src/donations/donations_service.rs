use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, error, info};

use super::donations_model::{Donation, DonationRequest, NewDonation};
use super::donations_traits::{DonationRepositoryTrait, DonationServiceTrait};
use crate::errors::{Error, Result, ValidationError};
use crate::events::{DomainEventSink, DonationEvent};
use crate::games::GameRepositoryTrait;
use crate::payments::{ChargeRequest, PaymentGateway};

/// Donation intake: validate, charge, store, then announce.
pub struct DonationService {
    donation_repository: Arc<dyn DonationRepositoryTrait>,
    game_repository: Arc<dyn GameRepositoryTrait>,
    payment_gateway: Arc<dyn PaymentGateway>,
    event_sink: Arc<dyn DomainEventSink>,
}

impl DonationService {
    pub fn new(
        donation_repository: Arc<dyn DonationRepositoryTrait>,
        game_repository: Arc<dyn GameRepositoryTrait>,
        payment_gateway: Arc<dyn PaymentGateway>,
        event_sink: Arc<dyn DomainEventSink>,
    ) -> Self {
        DonationService {
            donation_repository,
            game_repository,
            payment_gateway,
            event_sink,
        }
    }

    /// Checks a game-bound request against the game it targets.
    fn check_against_game(&self, game_id: &str, request: &DonationRequest) -> Result<()> {
        let game = self
            .game_repository
            .get_game(game_id)?
            .ok_or_else(|| Error::NotFound(format!("Game {}", game_id)))?;

        let now = Utc::now();
        if !game.is_active_at(now) || game.is_finished_at(now) {
            return Err(Error::GameNotActive(game.id));
        }

        if !game.accepts_organization(&request.organization_id) {
            return Err(ValidationError::InvalidInput(format!(
                "organization {} does not take part in game {}",
                request.organization_id, game.id
            ))
            .into());
        }

        if let Some(&tile) = request.tiles.iter().find(|&&t| !game.has_tile(t)) {
            return Err(ValidationError::TileNotOnBoard {
                game_id: game.id,
                tile,
            }
            .into());
        }

        let minimum = game.minimum_amount_for(request.tiles.len());
        if request.amount < minimum {
            return Err(ValidationError::InvalidInput(format!(
                "amount {} is below the {} required for {} tile(s)",
                request.amount,
                minimum,
                request.tiles.len()
            ))
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl DonationServiceTrait for DonationService {
    fn get_donation(&self, donation_id: &str) -> Result<Donation> {
        self.donation_repository
            .get_donation(donation_id)?
            .ok_or_else(|| Error::NotFound(format!("Donation {}", donation_id)))
    }

    async fn make_donation(&self, user_id: &str, request: DonationRequest) -> Result<Donation> {
        request.validate()?;
        if let Some(game_id) = request.game_id.as_deref() {
            self.check_against_game(game_id, &request)?;
        }

        let receipt = self
            .payment_gateway
            .charge(ChargeRequest {
                amount: request.amount,
                source: request.source.clone(),
                currency: request.currency.clone(),
            })
            .await?;
        debug!(
            "Charge {} captured for user {}",
            receipt.transaction_id, user_id
        );

        let new_donation = NewDonation {
            id: None,
            amount: request.amount,
            user_id: user_id.to_string(),
            organization_id: request.organization_id,
            game_id: request.game_id,
            transaction_id: receipt.transaction_id.clone(),
            date: request.date.unwrap_or_else(Utc::now),
            tiles: request.tiles,
        };

        // The charge is settled at this point; a failed write must reach the
        // caller and the logs together with the transaction id.
        let donation = self
            .donation_repository
            .insert_new_donation(new_donation)
            .await
            .map_err(|err| {
                error!(
                    "Charge {} was captured but the donation could not be stored: {}",
                    receipt.transaction_id, err
                );
                err
            })?;

        info!(
            "Stored donation {} ({} cents, {} tile(s))",
            donation.id,
            donation.amount,
            donation.tiles.len()
        );
        self.event_sink.emit(DonationEvent::new(
            donation.game_id.clone(),
            donation.organization_id.clone(),
        ));
        Ok(donation)
    }

    async fn delete_donation(&self, donation_id: String) -> Result<usize> {
        let deleted = self.donation_repository.delete_donation(donation_id).await?;
        if deleted == 0 {
            return Err(Error::NotFound("Donation".to_string()));
        }
        Ok(deleted)
    }
}
