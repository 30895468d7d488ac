//! `contentforge rules` — Show the structural rule set per content profile.

use contentforge_config::RuleSet;
use contentforge_core::ContentProfile;

pub async fn run(profile: Option<ContentProfile>) -> Result<(), Box<dyn std::error::Error>> {
    let profiles = match profile {
        Some(p) => vec![p],
        None => ContentProfile::ALL.to_vec(),
    };

    for (i, profile) in profiles.into_iter().enumerate() {
        if i > 0 {
            println!();
        }
        print_rules(profile, &RuleSet::for_profile(profile));
    }

    Ok(())
}

fn print_rules(profile: ContentProfile, rules: &RuleSet) {
    let yes_no = |flag: bool| if flag { "yes" } else { "no" };

    println!("📐 {} ({})", profile.label(), profile.slug());
    println!("─────────────────────────────────────");
    println!("  Question H2s:          {}", yes_no(rules.require_h2_questions));
    println!(
        "  Answer-first intro:    {} ({}-{} words)",
        yes_no(rules.require_answer_first_intro),
        rules.intro_min_words,
        rules.intro_max_words
    );
    println!(
        "  Chunk length:          {}-{} words",
        rules.chunk_length_min, rules.chunk_length_max
    );
    println!(
        "  FAQ:                   {} (min {} entries)",
        yes_no(rules.require_faq),
        rules.faq_min_entries
    );
    println!("  Title:                 <= {} chars", rules.title_max_chars);
    println!(
        "  Meta description:      {}-{} chars",
        rules.meta_description_min_chars, rules.meta_description_max_chars
    );
    println!("  Max sentence length:   {} words", rules.max_sentence_words);
    println!("  Evidence density:      {}", yes_no(rules.evidence_density_check));
    println!("  SVO preference:        {}", rules.svo_preference);
}
