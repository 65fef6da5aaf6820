use acadex::router::init_router;
use acadex::state::init_app_state;
use dotenvy::dotenv;
use std::net::SocketAddr;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() {
    dotenv().ok();

    let args: Vec<String> = std::env::args().collect();

    // Check if this is a CLI command
    if args.len() > 1 && args[1] == "create-admin" {
        handle_create_admin(args).await;
        return;
    }

    // Normal server startup
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "acadex=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let state = init_app_state().await;
    let app = init_router(state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
    println!("🚀 Server running on http://localhost:3000");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}

async fn handle_create_admin(args: Vec<String>) {
    if args.len() != 4 {
        eprintln!("Usage: {} create-admin <email> <password>", args[0]);
        std::process::exit(1);
    }

    let email = &args[2];
    let password = &args[3];

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to database");

    match acadex::cli::create_admin(&pool, email, password).await {
        Ok(_) => {
            println!("✅ Admin created successfully!");
            println!("   Email: {}", email);
        }
        Err(e) => {
            eprintln!("❌ Error creating admin: {}", e);
            std::process::exit(1);
        }
    }
}
