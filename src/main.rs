use caseforge_lib::infrastructure::config::AppConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("caseforge: {}", err);
            std::process::exit(2);
        }
    };
    caseforge_lib::init_tracing(&config.log_level);
    caseforge_lib::run(config).await
}
