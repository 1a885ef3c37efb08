use giftgrab_server::{app, AppState, Config};

#[tokio::main]
async fn main() {
    env_logger::init();

    let config = Config::from_env();
    let state = AppState::from_config(config.clone()).await;
    state
        .registry
        .spawn_sweeper(config.sweep_interval, config.idle_timeout);

    log::info!("starting giftgrab server on {}", config.bind_addr);
    axum::serve(
        tokio::net::TcpListener::bind(&config.bind_addr)
            .await
            .expect("bind"),
        app(state),
    )
    .await
    .expect("server error");
}
