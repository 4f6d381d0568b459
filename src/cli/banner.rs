//! ASCII art banner for interactive mode.

use std::io::IsTerminal;

/// ANSI true-color escape sequences for the banner palette.
struct Colors {
    shell_dark: &'static str,
    shell_light: &'static str,
    face: &'static str,
    eyes: &'static str,
    title: &'static str,
    subtitle: &'static str,
    reset: &'static str,
}

const COLOR: Colors = Colors {
    shell_dark: "\x1b[38;2;139;90;73m",
    shell_light: "\x1b[38;2;181;132;108m",
    face: "\x1b[38;2;194;150;130m",
    eyes: "\x1b[38;2;255;255;255m",
    title: "\x1b[1;38;2;220;165;120m",
    subtitle: "\x1b[38;2;100;100;120m",
    reset: "\x1b[0m",
};

const PLAIN: Colors = Colors {
    shell_dark: "",
    shell_light: "",
    face: "",
    eyes: "",
    title: "",
    subtitle: "",
    reset: "",
};

/// Prints the arbiter banner to stdout.
///
/// Renders ANSI true-color when stdout is a terminal,
/// falls back to plain text otherwise.
pub fn print_banner() {
    let c = if std::io::stdout().is_terminal() {
        &COLOR
    } else {
        &PLAIN
    };

    let sd = c.shell_dark;
    let sl = c.shell_light;
    let fc = c.face;
    let ey = c.eyes;
    let tt = c.title;
    let st = c.subtitle;
    let r = c.reset;

    println!(
        r#"
{sd}     ▄▄▄▄▄▄▄▄▄{r}
{sl}   ▄█▒█▒█▒█▒█▒█▄{r}        {tt} __ _ _ __| |__ (_) |_ ___ _ __{r}
{sd}  █▒█▒█▒█▒█▒█▒█▒█{r}       {tt}/ _` | '__| '_ \| | __/ _ \ '__|{r}
{fc}  █▄▄▄▄▄▄▄▄▄▄▄▄▄█{r}       {tt}| (_| | |  | |_) | | ||  __/ |{r}
{fc}  █░░░{ey}●{fc}░░░░░{ey}●{fc}░░░█{r}       {tt} \__,_|_|  |_.__/|_|\__\___|_|{r}
{fc}  █░░░░░░░░░░░░░█{r}
{fc}   █░░░░▄▄░░░░░█{r}
{fc}    ▀█▄▄▄▄▄▄▄█▀{r}         {st}one-of-many / yes-no / late-market{r}
{fc}     ▀█▀   ▀█▀{r}
"#
    );
}
