use clap::*;
use std::io::Write;

use clsim::*;

// Create clap command arguments
pub fn make_command() -> Command {
    Command::new("clsim")
        .version(crate_version!())
        .about("Extrinsic similarity measures for overlapping and multi-resolution clusterings")
        .arg_required_else_help(true)
        .color(ColorChoice::Auto)
        .after_help(
            r###"
* <clustering1> and <clustering2> are CNL (cluster nodes list) files
    * infile == stdin means reading from STDIN
    * each line lists the member node ids of one cluster, `#` comments and
      an optional `id>` prefix are skipped

* Measures
    * --f1: mean F1 of the greatest matches, F1p / F1h / F1s
    * --nmi: normalized mutual information
    * --omega / --extended: (extended) Omega Index

"###,
        )
        .arg(
            Arg::new("clustering1")
                .required(true)
                .index(1)
                .help("First input clustering, the ground truth if any"),
        )
        .arg(
            Arg::new("clustering2")
                .required(true)
                .index(2)
                .help("Second (evaluated) input clustering"),
        )
        .arg(
            Arg::new("ovp")
                .long("ovp")
                .action(ArgAction::SetTrue)
                .help("Evaluate overlapping instead of multi-resolution clusters"),
        )
        .arg(
            Arg::new("sync")
                .long("sync")
                .num_args(1)
                .value_name("file")
                .help("Synchronize the node bases with the specified CNL file"),
        )
        .arg(
            Arg::new("membership")
                .long("membership")
                .num_args(1)
                .default_value("1")
                .value_parser(value_parser!(f32))
                .help("Average expected membership of the nodes, > 0, for container pre-sizing"),
        )
        .arg(
            Arg::new("unique")
                .long("unique")
                .action(ArgAction::SetTrue)
                .help("Deduplicate the members within each cluster on loading"),
        )
        .arg(
            Arg::new("f1")
                .long("f1")
                .num_args(0..=1)
                .default_missing_value("partprob")
                .value_parser([
                    builder::PossibleValue::new("partprob"),
                    builder::PossibleValue::new("harmonic"),
                    builder::PossibleValue::new("average"),
                ])
                .help("Evaluate F1 of the greatest matches: F1p, F1h or F1s"),
        )
        .arg(
            Arg::new("kind")
                .long("kind")
                .num_args(1)
                .default_value("weighted")
                .value_parser([
                    builder::PossibleValue::new("weighted"),
                    builder::PossibleValue::new("unweighed"),
                    builder::PossibleValue::new("combined"),
                ])
                .help("Averaging policy of the per-cluster greatest matches"),
        )
        .arg(
            Arg::new("nmi")
                .long("nmi")
                .action(ArgAction::SetTrue)
                .help("Evaluate NMI (Normalized Mutual Information)"),
        )
        .arg(
            Arg::new("all")
                .long("all")
                .action(ArgAction::SetTrue)
                .help("Evaluate all NMIs using sqrt, avg and min denominators besides the max one"),
        )
        .arg(
            Arg::new("ln")
                .long("ln")
                .action(ArgAction::SetTrue)
                .help("Use ln (exp base) instead of log2 for the information measuring"),
        )
        .arg(
            Arg::new("omega")
                .long("omega")
                .action(ArgAction::SetTrue)
                .help("Evaluate the Omega Index"),
        )
        .arg(
            Arg::new("extended")
                .long("extended")
                .action(ArgAction::SetTrue)
                .help("Evaluate the extended Omega Index, which does not excessively penalize distinct node shares"),
        )
        .arg(
            Arg::new("detailed")
                .long("detailed")
                .action(ArgAction::SetTrue)
                .help("Detailed (verbose) results output"),
        )
        .arg(
            Arg::new("label")
                .long("label")
                .num_args(1)
                .value_name("file")
                .help("Label the evaluated clusters with the ground-truth clusters of the specified CNL file and evaluate F1 of the matched labeled clusters"),
        )
        .arg(
            Arg::new("identifiers")
                .long("identifiers")
                .num_args(1)
                .value_name("file")
                .help("Output the ground-truth labels of the evaluated clusters as lines of space-separated indices (.cll)"),
        )
}

fn parse_f1_kind(value: &str) -> F1Kind {
    match value {
        "partprob" => F1Kind::PartProb,
        "harmonic" => F1Kind::Harmonic,
        "average" => F1Kind::Average,
        _ => unreachable!(),
    }
}

fn parse_match_kind(value: &str) -> MatchKind {
    match value {
        "weighted" => MatchKind::Weighted,
        "unweighed" => MatchKind::Unweighted,
        "combined" => MatchKind::Combined,
        _ => unreachable!(),
    }
}

// Command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let infile1 = args.get_one::<String>("clustering1").unwrap();
    let infile2 = args.get_one::<String>("clustering2").unwrap();

    let opt_ovp = args.get_flag("ovp");
    let opt_sync = args.get_one::<String>("sync");
    let opt_membership = *args.get_one::<f32>("membership").unwrap();
    let opt_unique = args.get_flag("unique");
    let opt_f1 = args.get_one::<String>("f1");
    let opt_kind = args.get_one::<String>("kind").unwrap();
    let opt_nmi = args.get_flag("nmi");
    let opt_all = args.get_flag("all");
    let opt_ln = args.get_flag("ln");
    let opt_extended = args.get_flag("extended");
    let opt_omega = args.get_flag("omega") || opt_extended;
    let opt_detailed = args.get_flag("detailed");
    let opt_label = args.get_one::<String>("label");
    let opt_identifiers = args.get_one::<String>("identifiers");

    if opt_f1.is_none() && !opt_nmi && !opt_omega && opt_label.is_none() {
        eprintln!("WARNING, no measures to evaluate specified");
        return Err(MeasureError::InvalidInput(
            "select at least one of --f1, --nmi, --omega or --label".to_string(),
        )
        .into());
    }
    if opt_membership <= 0.0 {
        eprintln!("ERROR, positive membership is expected: {}", opt_membership);
        std::process::exit(libc::EDOM);
    }
    if opt_identifiers.is_some() && opt_label.is_none() {
        return Err(MeasureError::InvalidInput(
            "--identifiers requires --label".to_string(),
        )
        .into());
    }
    if let (Some(sync), Some(label)) = (opt_sync, opt_label) {
        if sync != label {
            return Err(MeasureError::InvalidInput(
                "the node base file should correspond to the labeled clusters if both are specified"
                    .to_string(),
            )
            .into());
        }
    }

    let mode = if opt_ovp {
        Counting::Overlap
    } else {
        Counting::MultiRes
    };
    let trace = Trace::new(opt_detailed);
    let opts = LoadOpts {
        membership: opt_membership,
        unique: opt_unique,
        ..Default::default()
    };

    //----------------------------
    // Loading
    //----------------------------
    let ndbase = match opt_sync {
        Some(infile) => Some(NodeBase::load_cnl(infile)?),
        None => None,
    };

    let mut cn1 = Collection::load_cnl(
        infile1,
        &opts,
        ndbase.as_ref().map(|nb| (nb, BaseMode::Sync)),
    )?;
    if opt_detailed {
        println!(
            "Loaded {} clusters {} nodes from {}",
            cn1.clusters_num(),
            cn1.nodes_num(),
            infile1
        );
    }
    if let Some(nb) = &ndbase {
        // The first collection must cover the whole node base
        if cn1.ndshash() != nb.hash() {
            return Err(MeasureError::NodeBaseMismatch(format!(
                "node base digest {} ({} nodes) != filtered collection digest {} ({} nodes)",
                nb.hash().digest(),
                nb.hash().count(),
                cn1.ndshash().digest(),
                cn1.ndshash().count()
            ))
            .into());
        }
    }

    let base1 = opt_sync.map(|_| cn1.node_base());
    let mut cn2 = Collection::load_cnl(
        infile2,
        &opts,
        base1.as_ref().map(|nb| (nb, BaseMode::Sync)),
    )?;
    if opt_detailed {
        println!(
            "Loaded {} clusters {} nodes from {}",
            cn2.clusters_num(),
            cn2.nodes_num(),
            infile2
        );
    }

    if cn1.is_empty() || cn2.is_empty() {
        eprintln!(
            "WARNING, at least one of the collections is empty, there is nothing to evaluate. \
             Collection node counts: {}, {}",
            cn1.nodes_num(),
            cn2.nodes_num()
        );
        return Err(MeasureError::EmptyCollection(
            "both input clusterings must be non-empty".to_string(),
        )
        .into());
    }

    if cn1.ndshash() != cn2.ndshash() {
        eprintln!(
            "WARNING, the nodes in the collections differ: {} nodes (digest {}) != \
             {} nodes (digest {})",
            cn1.nodes_num(),
            cn1.ndshash().digest(),
            cn2.nodes_num(),
            cn2.ndshash().digest()
        );
        if opt_sync.is_some() {
            return Err(MeasureError::NodeBaseMismatch(
                "the node bases had to be synchronized".to_string(),
            )
            .into());
        }
    }

    //----------------------------
    // Evaluation
    //----------------------------
    println!(
        "= {} Evaluation =",
        if opt_ovp { "Overlaps" } else { "Multi-resolution" }
    );

    if opt_nmi {
        let base = if opt_ln { LogBase::Nats } else { LogBase::Bits };
        let rnmi = nmi(&mut cn1, &mut cn2, mode, base, trace)?;
        if opt_all {
            println!(
                "NMI_max: {:.6}, NMI_sqrt: {:.6}, NMI_avg: {:.6}, NMI_min: {:.6}",
                rnmi.max_norm(),
                rnmi.sqrt_norm(),
                rnmi.avg_norm(),
                rnmi.min_norm()
            );
        } else {
            println!("NMI_max: {:.6}", rnmi.max_norm());
        }
    }

    let f1_kind = parse_f1_kind(opt_f1.map(String::as_str).unwrap_or("partprob"));
    let match_kind = parse_match_kind(opt_kind);
    if opt_f1.is_some() {
        let res = f1(&mut cn1, &mut cn2, f1_kind, match_kind, mode, trace)?;
        println!(
            "F1{}_{}: {:.6}",
            f1_kind.suffix(),
            match_kind.suffix(),
            res.value
        );
        if opt_detailed {
            println!(
                "  recall: {:.6}, precision: {:.6}",
                res.recall, res.precision
            );
        }
    }

    if opt_omega {
        let idx = omega(&cn1, &cn2, opt_extended, trace)?;
        println!(
            "{}: {:.6}",
            if opt_extended { "OmegaExt" } else { "Omega" },
            idx
        );
    }

    if let Some(labfile) = opt_label {
        let mut gt = Collection::load_cnl(
            labfile,
            &opts,
            base1.as_ref().map(|nb| (nb, BaseMode::Sync)),
        )?;
        let labeling = label_clusters(&mut gt, &mut cn2, f1_kind, match_kind, mode, trace)?;
        println!(
            "F1_labels: {:.6}, precision: {:.6}, recall: {:.6}",
            labeling.f1, labeling.precision, labeling.recall
        );
        if let Some(outfile) = opt_identifiers {
            let mut writer = intspan::writer(outfile);
            for assigned in &labeling.labels {
                writer.write_fmt(format_args!(
                    "{}\n",
                    assigned
                        .iter()
                        .map(u32::to_string)
                        .collect::<Vec<_>>()
                        .join(" ")
                ))?;
            }
        }
    }

    Ok(())
}
