use balita::config::{builtin, builtin_names};

/// Print the built-in source profiles
pub fn sources() {
    println!("Built-in sources");
    println!("================");
    for name in builtin_names() {
        let Ok(profile) = builtin(name) else {
            continue;
        };
        println!("{name:<10} {} ({})", profile.display_name, profile.home_url);
        for seed in profile.fact_check.seeds.iter() {
            println!("  fake  {seed}");
        }
        for seed in profile.general.seeds.iter() {
            println!("  true  {seed}");
        }
    }
}
