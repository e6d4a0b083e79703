use log::info;
use mongodb::{options::ClientOptions, Client, Database};

use crate::config::Config;

pub struct MongoDB {
    pub client: Client,
    pub db: Database,
}

impl MongoDB {
    pub async fn init(config: &Config) -> Self {
        let client_options = ClientOptions::parse(&config.mongo_uri)
            .await
            .expect("Failed to parse MongoDB connection string");
        let client = Client::with_options(client_options).expect("Failed to initialize client");
        let db = client.database(&config.database_name);
        info!("Connected to database {}", config.database_name);
        MongoDB { client, db }
    }
}
