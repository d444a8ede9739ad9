fn main() {
    if handle_cli_flags() {
        return;
    }

    if let Err(err) = modtube::run() {
        eprintln!("error: {err:?}");
        std::process::exit(1);
    }
}

fn handle_cli_flags() -> bool {
    let mut saw_flag = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("modtube {}", modtube::VERSION);
                saw_flag = true;
            }
            "--help" | "-h" => {
                println!(
                    "modtube — Moderate YouTube spam comments from the terminal.\n\n  --version, -V        Show version and exit\n  --help,    -h        Show this help message\n\nKeys: 1-4 switch tabs · j/k move · Enter open comments · s sync channel\n      d delete comment · D delete all · f cycle history filter · r refresh\n      o open in browser · q quit"
                );
                saw_flag = true;
            }
            other => {
                eprintln!("unknown flag: {other}");
                std::process::exit(2);
            }
        }
    }
    saw_flag
}
