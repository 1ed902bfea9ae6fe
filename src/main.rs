//! Battle odds calculator CLI.
//!
//! Loads a scenario, simulates one battle many times and prints the odds.
//!
//! Usage:
//!   battlecalc --scenario FILE --territory NAME [OPTIONS]
//!
//! Options:
//!   --attacker P              Attacking player (the player whose turn it is)
//!   --defender P              Defending player (default: inferred)
//!   --attack type:n,...       Attacking units (default: attacker's units present)
//!   --defend type:n,...       Defending units (default: inferred)
//!   --bombard type:n,...      Bombarding sea units of the attacker
//!   --runs N                  Number of simulated battles (default: 2000)
//!   --threads N               Worker threads (default: available cores)
//!   --seed N                  Random seed, 0 for entropy
//!   --keep-one-land           Attacker keeps one land unit alive while it can
//!   --amphibious              Attacking land units came from the sea and cannot retreat
//!   --no-retreat              Battles are fought to the end
//!   --retreat-after-round N   Attacker retreats after round N
//!   --attacker-ool S          Attacker order of losses, e.g. "1^infantry;*^armour"
//!   --defender-ool S          Defender order of losses
//!   --json                    Print the summary as JSON
//!
//! Set RUST_LOG=debug for progress output on stderr.

use std::env;
use std::path::PathBuf;
use std::process;

use battlecalc::calculator::{BattleCalculator, BattleRequest};
use battlecalc::game::{GameData, PlayerId, TuvCosts, Unit};
use battlecalc::scenario::load_scenario;

const DEFAULT_RUNS: u32 = 2000;

#[derive(Debug, Default)]
struct Args {
    scenario: Option<PathBuf>,
    territory: Option<String>,
    attacker: Option<String>,
    defender: Option<String>,
    attack: Vec<(String, usize)>,
    defend: Vec<(String, usize)>,
    bombard: Vec<(String, usize)>,
    runs: Option<u32>,
    threads: Option<usize>,
    seed: Option<u64>,
    keep_one_land: bool,
    amphibious: bool,
    no_retreat: bool,
    retreat_after_round: Option<u32>,
    attacker_ool: Option<String>,
    defender_ool: Option<String>,
    json: bool,
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let args = match parse_args(&args[1..]) {
        Ok(Some(args)) => args,
        Ok(None) => {
            print_usage();
            return;
        }
        Err(e) => {
            eprintln!("{}", e);
            print_usage();
            process::exit(2);
        }
    };

    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let path = args.scenario.ok_or("--scenario is required")?;
    let territory = args.territory.ok_or("--territory is required")?;
    let scenario = load_scenario(&path)?;

    let mut config = scenario.calculator;
    if let Some(threads) = args.threads {
        config.threads = threads;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if args.keep_one_land {
        config.keep_one_attacking_land_unit = true;
    }
    if args.amphibious {
        config.amphibious = true;
    }
    if args.retreat_after_round.is_some() {
        config.retreat_after_round = args.retreat_after_round;
    }
    if let Some(ool) = args.attacker_ool {
        config.attacker_order_of_losses = ool;
    }
    if let Some(ool) = args.defender_ool {
        config.defender_order_of_losses = ool;
    }

    let mut calc = BattleCalculator::new(scenario.data, config);
    let mut request = BattleRequest::new(territory, args.runs.unwrap_or(DEFAULT_RUNS));
    request.retreat_allowed = !args.no_retreat;
    request.attacker = args
        .attacker
        .as_deref()
        .map(|name| find_player(calc.data(), name))
        .transpose()?;
    request.defender = args
        .defender
        .as_deref()
        .map(|name| find_player(calc.data(), name))
        .transpose()?;

    if !args.attack.is_empty() || !args.bombard.is_empty() {
        let attacker = request.attacker.ok_or("--attack and --bombard need --attacker")?;
        request.attacking_units = create_stacks(calc.data_mut(), &args.attack, attacker)?;
        request.bombarding_units = create_stacks(calc.data_mut(), &args.bombard, attacker)?;
    }
    if !args.defend.is_empty() {
        let defender = request.defender.ok_or("--defend needs --defender")?;
        request.defending_units = create_stacks(calc.data_mut(), &args.defend, defender)?;
    }

    let sides = calc.resolve_sides(&request)?;
    let results = calc.calculate(&request)?;
    let tuv_swing = results.average_tuv_swing(
        sides.attacker,
        &sides.attacking_units,
        sides.defender,
        &sides.defending_units,
        calc.data(),
    );

    if args.json {
        let mut summary = serde_json::to_value(results.summary())?;
        summary["attacker"] = calc.data().player_name(sides.attacker).into();
        summary["defender"] = calc.data().player_name(sides.defender).into();
        summary["average_tuv_swing"] = serde_json::to_value(tuv_swing)?;
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let data = calc.data();
    let (attacker_left, defender_left) = results.average_tuv_of_units_left_over(
        &data.costs_for_tuv(sides.attacker),
        &data.costs_for_tuv(sides.defender),
    );
    println!(
        "{} ({} units) attacks {} ({} units) in {}",
        data.player_name(sides.attacker),
        sides.attacking_units.len(),
        data.player_name(sides.defender),
        sides.defending_units.len(),
        request.territory
    );
    println!("Runs:               {}", results.len());
    println!("Attacker wins:      {:.1}%", results.attacker_win_percent() * 100.0);
    println!("Defender wins:      {:.1}%", results.defender_win_percent() * 100.0);
    println!("Draws:              {:.1}%", results.draw_percent() * 100.0);
    println!("Attacker units left {:.2}", results.average_attacking_units_left());
    println!("Defender units left {:.2}", results.average_defending_units_left());
    println!("Rounds fought:      {:.2}", results.average_battle_rounds_fought());
    println!("TUV swing:          {:.2}", tuv_swing);
    println!("TUV left over:      {:.2} / {:.2}", attacker_left, defender_left);
    println!("Time:               {:.1}ms", results.time().as_secs_f64() * 1000.0);
    Ok(())
}

fn find_player(data: &GameData, name: &str) -> Result<PlayerId, String> {
    data.player_by_name(name)
        .ok_or_else(|| format!("unknown player '{}'", name))
}

fn create_stacks(
    data: &mut GameData,
    stacks: &[(String, usize)],
    owner: PlayerId,
) -> Result<Vec<Unit>, String> {
    let mut units = Vec::new();
    for (unit_type, count) in stacks {
        let created = data
            .create_units(unit_type, *count, owner)
            .ok_or_else(|| format!("unknown unit type '{}'", unit_type))?;
        units.extend(created);
    }
    Ok(units)
}

/// Parses `infantry:3,armour:1`. A bare type name means one unit.
fn parse_stacks(value: &str) -> Result<Vec<(String, usize)>, String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|stack| match stack.split_once(':') {
            Some((unit_type, count)) => count
                .trim()
                .parse()
                .map(|n| (unit_type.trim().to_string(), n))
                .map_err(|_| format!("invalid unit count in '{}'", stack)),
            None => Ok((stack.to_string(), 1)),
        })
        .collect()
}

/// Returns `Ok(None)` when help was requested.
fn parse_args(args: &[String]) -> Result<Option<Args>, String> {
    let mut parsed = Args::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| {
            iter.next()
                .cloned()
                .ok_or_else(|| format!("missing value for {}", flag))
        };
        match arg.as_str() {
            "--scenario" => parsed.scenario = Some(PathBuf::from(value(arg.as_str())?)),
            "--territory" => parsed.territory = Some(value(arg.as_str())?),
            "--attacker" => parsed.attacker = Some(value(arg.as_str())?),
            "--defender" => parsed.defender = Some(value(arg.as_str())?),
            "--attack" => parsed.attack = parse_stacks(&value(arg.as_str())?)?,
            "--defend" => parsed.defend = parse_stacks(&value(arg.as_str())?)?,
            "--bombard" => parsed.bombard = parse_stacks(&value(arg.as_str())?)?,
            "--runs" => parsed.runs = Some(parse_number(arg, &value(arg.as_str())?)?),
            "--threads" => parsed.threads = Some(parse_number(arg, &value(arg.as_str())?)?),
            "--seed" => parsed.seed = Some(parse_number(arg, &value(arg.as_str())?)?),
            "--retreat-after-round" => {
                parsed.retreat_after_round = Some(parse_number(arg, &value(arg.as_str())?)?)
            }
            "--attacker-ool" => parsed.attacker_ool = Some(value(arg.as_str())?),
            "--defender-ool" => parsed.defender_ool = Some(value(arg.as_str())?),
            "--keep-one-land" => parsed.keep_one_land = true,
            "--amphibious" => parsed.amphibious = true,
            "--no-retreat" => parsed.no_retreat = true,
            "--json" => parsed.json = true,
            "--help" | "-h" => return Ok(None),
            other => return Err(format!("Unknown argument: {}", other)),
        }
    }
    Ok(Some(parsed))
}

fn parse_number<T: std::str::FromStr>(flag: &str, value: &str) -> Result<T, String> {
    value
        .parse()
        .map_err(|_| format!("invalid {} value: '{}'", flag, value))
}

fn print_usage() {
    eprintln!("Usage: battlecalc --scenario FILE --territory NAME [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --attacker P              Attacking player");
    eprintln!("  --defender P              Defending player (default: inferred)");
    eprintln!("  --attack type:n,...       Attacking units (default: attacker's units present)");
    eprintln!("  --defend type:n,...       Defending units (default: inferred)");
    eprintln!("  --bombard type:n,...      Bombarding sea units of the attacker");
    eprintln!(
        "  --runs N                  Number of simulated battles (default: {})",
        DEFAULT_RUNS
    );
    eprintln!("  --threads N               Worker threads (default: available cores)");
    eprintln!("  --seed N                  Random seed, 0 for entropy");
    eprintln!("  --keep-one-land           Attacker keeps one land unit alive while it can");
    eprintln!("  --amphibious              Attacking land units cannot retreat");
    eprintln!("  --no-retreat              Battles are fought to the end");
    eprintln!("  --retreat-after-round N   Attacker retreats after round N");
    eprintln!("  --attacker-ool S          Attacker order of losses, e.g. \"1^infantry;*^armour\"");
    eprintln!("  --defender-ool S          Defender order of losses");
    eprintln!("  --json                    Print the summary as JSON");
}
