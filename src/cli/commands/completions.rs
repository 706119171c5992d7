use crate::cli::{Cli, Shell};
use clap::CommandFactory;
use clap_complete::{generate, Shell as ClapShell};
use std::io;

pub fn execute(shell: Shell) {
    let mut cmd = Cli::command();
    let bin_name = "aws-sso-wrapper";

    let clap_shell = match shell {
        Shell::Bash => ClapShell::Bash,
        Shell::Zsh => ClapShell::Zsh,
        Shell::Fish => ClapShell::Fish,
        Shell::PowerShell => ClapShell::PowerShell,
        Shell::Elvish => ClapShell::Elvish,
    };

    generate(clap_shell, &mut cmd, bin_name, &mut io::stdout());

    match shell {
        Shell::Bash => eprintln!("# Add to ~/.bashrc: eval \"$(aws-sso-wrapper --completions bash)\""),
        Shell::Zsh => eprintln!("# Add to ~/.zshrc: eval \"$(aws-sso-wrapper --completions zsh)\""),
        Shell::Fish => eprintln!(
            "# Save with: aws-sso-wrapper --completions fish > ~/.config/fish/completions/aws-sso-wrapper.fish"
        ),
        Shell::PowerShell => eprintln!(
            "# Add to profile: aws-sso-wrapper --completions powershell | Out-String | Invoke-Expression"
        ),
        Shell::Elvish => eprintln!("# Add to rc.elv: eval (aws-sso-wrapper --completions elvish | slurp)"),
    }
}
