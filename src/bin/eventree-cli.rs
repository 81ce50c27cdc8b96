//! CLI Eventree
//!
//! Выполняет сценарии подписок и публикаций из файла или в интерактивном
//! режиме (REPL).

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use eventree::{
    error::{LogLevel, StackError},
    init_logging, Settings, Shell,
};
use rustyline::{error::ReadlineError, DefaultEditor};
use tracing::{debug, error, info, trace, warn};

/// Основная структура CLI аргументов
#[derive(Parser)]
#[command(name = "eventree-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_COMMIT"), ")"))]
#[command(about = "Eventree CLI - run hierarchical event scripts", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Файл настроек (по умолчанию `eventree.toml`, если есть)
    #[arg(short, long, env = "EVENTREE_CONFIG")]
    config: Option<PathBuf>,
    /// Включить подробный вывод (debug)
    #[arg(short, long, help = "Включить подробный вывод для отладки")]
    verbose: bool,
    /// Подавить логирование полностью
    #[arg(short = 'q', long, help = "Подавить логирование")]
    quiet: bool,
    /// Подкоманда для выполнения
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Подкоманды CLI
#[derive(Subcommand)]
enum Commands {
    /// Выполнить сценарий из файла
    Run {
        /// Путь к сценарию
        script: PathBuf,
    },
    /// Интерактивный режим (REPL)
    #[command(alias = "i")]
    Repl {
        /// Путь к файлу истории команд
        #[arg(long, help = "Файл для сохранения истории команд")]
        history: Option<PathBuf>,
    },
}

/// Точка входа в CLI
fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings =
        Settings::load(cli.config.as_deref()).context("Не удалось загрузить настройки")?;
    if cli.quiet {
        settings.logging.level = "off".to_string();
    } else if cli.verbose {
        settings.logging.level = "debug".to_string();
    }
    init_logging(settings.logging.clone())?;
    debug!(?settings, "settings loaded");

    let mut shell = Shell::new(settings.dispatcher);
    let result = match cli.command {
        Some(Commands::Run { script }) => run_script(&mut shell, &script),
        Some(Commands::Repl { history }) => repl(&mut shell, history),
        None => repl(&mut shell, None),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

/// Выполнение сценария из файла
fn run_script(
    shell: &mut Shell,
    path: &Path,
) -> Result<()> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Не удалось прочитать сценарий {}", path.display()))?;
    for line in shell.run_script(&source)? {
        println!("{line}");
    }
    Ok(())
}

/// Интерактивный режим (REPL)
fn repl(
    shell: &mut Shell,
    history: Option<PathBuf>,
) -> Result<()> {
    println!("eventree-cli {}", env!("CARGO_PKG_VERSION"));
    println!("Введите `help` для списка команд, Ctrl-D для выхода.");

    let mut editor = DefaultEditor::new()?;
    if let Some(path) = &history {
        // файла может ещё не быть
        let _ = editor.load_history(path);
    }

    loop {
        match editor.readline("eventree> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                editor.add_history_entry(line.as_str())?;
                match shell.execute(&line) {
                    Ok(Some(out)) => println!("{out}"),
                    Ok(None) => {}
                    Err(e) => {
                        log_failure(&line, &e);
                        eprintln!("(error) {}", e.client_message());
                    }
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    if let Some(path) = &history {
        editor
            .save_history(path)
            .with_context(|| format!("Не удалось сохранить историю в {}", path.display()))?;
    }
    Ok(())
}

/// Пишет ошибку команды в лог с уровнем, подобранным по её коду.
fn log_failure(
    line: &str,
    err: &StackError,
) {
    let code = err.status_code();
    match err.log_level() {
        LogLevel::Trace => trace!(line, %code, error = ?err, "command failed"),
        LogLevel::Debug => debug!(line, %code, error = ?err, "command failed"),
        LogLevel::Info => info!(line, %code, error = ?err, "command failed"),
        LogLevel::Warn => warn!(line, %code, error = ?err, "command failed"),
        LogLevel::Error => error!(line, %code, error = ?err, "command failed"),
    }
}
