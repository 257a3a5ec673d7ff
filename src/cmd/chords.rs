use crate::reports;
use chordforge::error::CfResult;
use chordforge::profile::KeyerProfile;
use clap::Args;
use itertools::Itertools;

#[derive(Args, Debug, Clone)]
pub struct ChordsArgs {
    /// Also print every chord of the search and colony universes.
    #[arg(long, default_value_t = false)]
    pub list: bool,
}

pub fn run(args: &ChordsArgs, profile: &KeyerProfile) -> CfResult<()> {
    let search = profile.search_space()?;
    let colony = profile.colony_space()?;
    let generation = profile.generation_space();

    reports::print_chord_spaces(&[
        ("generation", &generation, 0),
        ("search", &search, profile.search_exclusions.len()),
        ("colony", &colony, profile.colony_exclusions.len()),
    ]);

    if args.list {
        for (name, space) in [("search", &search), ("colony", &colony)] {
            println!("\n{} ({}):", name, space.len());
            for row in &space.chords().iter().chunks(12) {
                println!("  {}", row.map(|c| c.to_string()).join(" "));
            }
        }
    }
    Ok(())
}
