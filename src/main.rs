use clap::{Arg, ArgMatches, Command};
use std::error::Error;

use moments::{AppBootstrap, AppConfig};

/// 构建命令行应用
fn build_app() -> Command {
    Command::new("moments")
        .version(env!("CARGO_PKG_VERSION"))
        .about("moments 社交动态服务端")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("server")
                .about("启动 Web 服务器")
                .arg(
                    Arg::new("host")
                        .long("host")
                        .value_name("HOST")
                        .help("设置服务器主机地址"),
                )
                .arg(
                    Arg::new("port")
                        .short('p')
                        .long("port")
                        .value_name("PORT")
                        .help("设置服务器端口"),
                )
                .arg(
                    Arg::new("workers")
                        .short('w')
                        .long("workers")
                        .value_name("WORKERS")
                        .help("设置工作线程数"),
                ),
        )
        .subcommand(Command::new("version").about("显示版本信息"))
}

#[actix_web::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let matches: ArgMatches = build_app().get_matches();

    match matches.subcommand() {
        Some(("server", sub_matches)) => {
            handle_server_command(sub_matches).await?;
        }
        Some(("version", _)) => {
            println!("moments {}", env!("CARGO_PKG_VERSION"));
        }
        _ => {
            eprintln!("未知命令，请使用 --help 查看可用命令");
            std::process::exit(1);
        }
    }

    Ok(())
}

async fn handle_server_command(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    // 配置优先级：命令行参数 > 配置文件/环境变量 > 默认值
    let mut config = AppConfig::from_config()?;
    if let Some(host) = matches.get_one::<String>("host") {
        config.host = host.clone();
    }
    if let Some(port) = matches.get_one::<String>("port") {
        config.port = port.parse()?;
    }
    if let Some(workers) = matches.get_one::<String>("workers") {
        config.workers = Some(workers.parse()?);
    }

    AppBootstrap::new().with_config(config).run().await?;
    Ok(())
}
