use anyhow::{bail, Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use indicatif::{ProgressBar, ProgressStyle};
use natural_net::core::systems::gaussian_images;
use natural_net::{
    ConvSettings, GaussianSource, NaturalNet, NaturalNetConfig, StatisticsMode,
};
use ndarray::{Array1, Array2, ArrayD};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::process;

fn main() {
    env_logger::init();

    let matches = Command::new("natural_demo")
        .version("0.1.0")
        .about("화이트닝 재매개변수화 데모: 합성 가우시안 배치로 reparam_op를 반복 실행")
        .arg(
            Arg::new("layers")
                .long("layers")
                .value_name("SIZES")
                .help("쉼표로 구분한 레이어 폭 (예: 4,3,2)")
                .default_value("4,3,2"),
        )
        .arg(
            Arg::new("input-dim")
                .long("input-dim")
                .value_name("DIM")
                .help("밀집 입력 차원")
                .default_value("4"),
        )
        .arg(
            Arg::new("epsilon")
                .long("epsilon")
                .value_name("EPS")
                .help("고유값 안정화 상수")
                .default_value("0.001"),
        )
        .arg(
            Arg::new("samples")
                .long("samples")
                .short('n')
                .value_name("COUNT")
                .help("라운드당 샘플 수")
                .default_value("20000"),
        )
        .arg(
            Arg::new("rounds")
                .long("rounds")
                .short('r')
                .value_name("COUNT")
                .help("재매개변수화 반복 횟수")
                .default_value("3"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_name("SEED")
                .help("초기화와 샘플링 난수 시드")
                .default_value("42"),
        )
        .arg(
            Arg::new("centered")
                .long("centered")
                .action(ArgAction::SetTrue)
                .help("비중심 2차 모멘트 대신 공분산을 화이트닝"),
        )
        .arg(
            Arg::new("conv")
                .long("conv")
                .action(ArgAction::SetTrue)
                .help("합성곱 아키텍처 (기본 28×28×1 입력)"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("FILE")
                .help("JSON 설정 파일 (지정하면 구조 관련 플래그는 무시)"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("라운드별 기록을 JSON으로 출력"),
        )
        .get_matches();

    if let Err(e) = run(&matches) {
        eprintln!("❌ 오류: {e:#}");
        process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<()> {
    let config = build_config(matches)?;
    let samples: usize = parse(matches, "samples")?;
    let rounds: usize = parse(matches, "rounds")?;
    let as_json = matches.get_flag("json");

    println!("🧠 자연 신경망 데모");
    println!("   레이어: {:?}", config.layer_sizes);
    println!("   ε: {}, 통계: {:?}, 시드: {}", config.epsilon, config.statistics, config.seed);

    let mut sampler = Sampler::new(&config)?;
    let mut net = NaturalNet::new(config)?;
    let held_out = sampler.batch(samples.min(512));
    let reference = net.forward(held_out.view())?.output;

    let progress = ProgressBar::new(rounds as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("🔁 [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .context("진행 표시 템플릿")?
            .progress_chars("█▉▊▋▌▍▎▏ "),
    );

    for round in 1..=rounds {
        progress.set_message(format!("라운드 {round}: 샘플 {samples}개"));
        let batch = sampler.batch(samples);
        let report = net.reparam_op(batch.view())?;
        if as_json {
            progress.println(serde_json::to_string(&report)?);
        }
        progress.inc(1);
    }
    progress.finish_with_message("재매개변수화 완료");

    let output = net.forward(held_out.view())?.output;
    let scale = reference.iter().fold(1e-12_f64, |acc, v| acc.max(v.abs()));
    let drift = (&output - &reference)
        .iter()
        .fold(0.0_f64, |acc, v| acc.max(v.abs()))
        / scale;
    println!("📏 함수 보존 상대 오차: {drift:.3e}");

    let fresh = sampler.batch(samples);
    let diagnostics = net.whitening_diagnostics(fresh.view())?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&diagnostics)?);
    } else {
        println!("📊 새 배치 화이트닝 진단:");
        for diagnostic in &diagnostics {
            println!(
                "   레이어 {}: 관측 {}, max|평균| = {:.4}, ‖UᵗΣU - I‖_F = {:.4}",
                diagnostic.layer,
                diagnostic.observations,
                diagnostic.mean_max_abs,
                diagnostic.moment_deviation
            );
        }
    }
    Ok(())
}

fn build_config(matches: &ArgMatches) -> Result<NaturalNetConfig> {
    let seed: u64 = parse(matches, "seed")?;
    let statistics = if matches.get_flag("centered") {
        StatisticsMode::Centered
    } else {
        StatisticsMode::Uncentered
    };

    if let Some(path) = matches.get_one::<String>("config") {
        let config = NaturalNetConfig::from_json_file(path)
            .with_context(|| format!("설정 파일 로드 실패: {path}"))?;
        return Ok(config);
    }

    let layers = matches
        .get_one::<String>("layers")
        .map(String::as_str)
        .unwrap_or_default();
    let layer_sizes = layers
        .split(',')
        .map(|size| size.trim().parse::<usize>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("레이어 폭 파싱 실패: {layers}"))?;
    let epsilon: f64 = parse(matches, "epsilon")?;

    let config = if matches.get_flag("conv") {
        NaturalNetConfig::conv(&layer_sizes, ConvSettings::default(), epsilon)
    } else {
        NaturalNetConfig::dense(&layer_sizes, parse(matches, "input-dim")?, epsilon)
    };
    let config = config.with_seed(seed).with_statistics(statistics);
    config.validate()?;
    Ok(config)
}

fn parse<T>(matches: &ArgMatches, name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let Some(raw) = matches.get_one::<String>(name) else {
        bail!("--{name} 값이 없음");
    };
    raw.parse::<T>()
        .with_context(|| format!("--{name} 값 파싱 실패: {raw}"))
}

/// 설정된 아키텍처에 맞는 합성 입력 배치
enum Source {
    Dense(GaussianSource),
    Images(ConvSettings),
}

struct Sampler {
    source: Source,
    rng: StdRng,
}

impl Sampler {
    fn new(config: &NaturalNetConfig) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(1));
        let source = match &config.architecture {
            natural_net::Architecture::Dense { input_dim } => {
                Source::Dense(skewed_gaussian(*input_dim, &mut rng)?)
            }
            natural_net::Architecture::Conv(settings) => Source::Images(settings.clone()),
        };
        Ok(Self { source, rng })
    }

    fn batch(&mut self, size: usize) -> ArrayD<f64> {
        match &self.source {
            Source::Dense(source) => source.sample(&mut self.rng, size).into_dyn(),
            Source::Images(s) => {
                gaussian_images(&mut self.rng, size, s.height, s.width, s.channels, 0.5, 0.25)
                    .into_dyn()
            }
        }
    }
}

/// 하삼각 혼합 행렬로 축마다 분산과 상관이 다른 분포
fn skewed_gaussian(dim: usize, rng: &mut StdRng) -> Result<GaussianSource> {
    let mut mixing = Array2::<f64>::zeros((dim, dim));
    for i in 0..dim {
        mixing[[i, i]] = 2.0 / (1.0 + i as f64);
        for j in 0..i {
            mixing[[i, j]] = rng.gen_range(-0.5..0.5);
        }
    }
    Ok(GaussianSource::new(Array1::zeros(dim), mixing)?)
}
