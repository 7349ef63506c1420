use eframe::egui;
use log::info;
use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

mod analysis;
mod config;
mod derivative;
mod expr;
mod gui;
mod parser;
mod render;
mod surface;

fn main() -> anyhow::Result<()> {
    let config = config::AppConfig::from_env()?;

    CombinedLogger::init(vec![TermLogger::new(
        config.log_level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )])?;
    info!("Программа запущена, уровень логирования {}", config.log_level);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1200.0, 800.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Частные производные",
        options,
        Box::new(|_cc| Ok(Box::new(gui::PartialDerivativesApp::new(config)))),
    )
    .map_err(|e| anyhow::anyhow!("ошибка окна: {}", e))?;

    info!("Программа завершена");
    Ok(())
}
