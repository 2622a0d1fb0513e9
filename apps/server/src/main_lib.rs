use std::sync::Arc;

use crate::config::{Config, MailConfig};
use cowchips_core::{
    donations::{DonationService, DonationServiceTrait},
    events::DomainEventSink,
    games::{GameService, GameServiceTrait},
    mailing::{BulkEmailClient, HttpBulkEmailClient, HttpMailerConfig, LogOnlyEmailClient},
    notifications::{WinnerNotifier, WinnerNotifierTrait},
    payments::PrecapturedPaymentGateway,
    relay::DonationRelay,
};
use cowchips_storage_sqlite::{
    db, donations::DonationRepository, games::GameRepository, users::UserRepository,
};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub struct AppState {
    pub game_service: Arc<dyn GameServiceTrait>,
    pub donation_service: Arc<dyn DonationServiceTrait>,
    pub winner_notifier: Arc<dyn WinnerNotifierTrait>,
    pub relay: DonationRelay,
}

pub fn init_tracing() {
    let log_format = std::env::var("CC_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    let result = if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .try_init()
    };
    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}

fn build_mail_client(mail: &MailConfig) -> anyhow::Result<Arc<dyn BulkEmailClient>> {
    match &mail.endpoint {
        Some(endpoint) => {
            tracing::info!("Winner emails go to mail gateway {}", endpoint);
            let client = HttpBulkEmailClient::new(HttpMailerConfig {
                endpoint: endpoint.clone(),
                api_key: mail.api_key.clone(),
                source: mail.source.clone(),
                timeout: mail.timeout,
            })?;
            Ok(Arc::new(client))
        }
        None => {
            tracing::warn!("CC_MAIL_ENDPOINT is not set; winner emails will only be logged");
            Ok(Arc::new(LogOnlyEmailClient))
        }
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let db_path = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = db::spawn_writer(pool.clone());

    let game_repo = Arc::new(GameRepository::new(pool.clone(), writer.clone()));
    let donation_repo = Arc::new(DonationRepository::new(pool.clone(), writer.clone()));
    let user_repo = Arc::new(UserRepository::new(pool.clone(), writer.clone()));

    let relay = DonationRelay::new();
    let event_sink: Arc<dyn DomainEventSink> = Arc::new(relay.clone());

    let game_service = Arc::new(GameService::new(game_repo.clone()));
    let donation_service = Arc::new(DonationService::new(
        donation_repo.clone(),
        game_repo.clone(),
        Arc::new(PrecapturedPaymentGateway),
        event_sink,
    ));
    let winner_notifier = Arc::new(
        WinnerNotifier::new(
            game_repo,
            donation_repo,
            user_repo,
            build_mail_client(&config.mail)?,
        )
        .with_templates(config.templates.clone()),
    );

    Ok(Arc::new(AppState {
        game_service,
        donation_service,
        winner_notifier,
        relay,
    }))
}
