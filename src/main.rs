#[tokio::main]
async fn main() {
    if let Err(e) = studyai::run().await {
        tracing::error!("StudyAI failed to start: {}", e);
        eprintln!("studyai: {}", e);
        std::process::exit(1);
    }
}
