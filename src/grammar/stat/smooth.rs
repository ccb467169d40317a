//! Smoothed conditional means.

use super::{frame, numeric, weights, StatCompute};
use crate::data::DataFrame;
use crate::error::{Error, Result};
use crate::grammar::layout::PanelScales;
use crate::grammar::params::Params;

const METHODS: &[&str] = &["auto", "lm", "loess"];

/// Groups with at least this many rows use `lm` under `method = "auto"`.
const AUTO_LM_ROWS: usize = 1000;

/// Fitted curve of y on x with a pointwise confidence band.
///
/// `method` is `lm` (weighted least squares line), `loess` (local linear
/// regression with tricube weights over a `span` share of the data) or
/// `auto`. Produces `x`, `y`, and with `se` also `ymin`, `ymax` and `se`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmoothStat;

impl StatCompute for SmoothStat {
    fn name(&self) -> &str {
        "smooth"
    }

    fn required_aes(&self) -> &[&str] {
        &["x", "y"]
    }

    fn default_params(&self) -> Params {
        Params::new()
            .with("method", "auto")
            .with("se", true)
            .with("n", 80.0)
            .with("fullrange", false)
            .with("level", 0.95)
            .with("span", 2.0 / 3.0)
    }

    fn setup_params(&self, data: &DataFrame, mut params: Params) -> Result<Params> {
        let method = params.str("method").unwrap_or("auto");
        if !METHODS.contains(&method) {
            return Err(Error::invalid_parameter(
                "stat_smooth",
                "method",
                format!("expected one of {}", METHODS.join(", ")),
            ));
        }
        let level = params.f64("level").unwrap_or(0.95);
        if !(level > 0.0 && level < 1.0) {
            return Err(Error::invalid_parameter("stat_smooth", "level", "must be between 0 and 1"));
        }
        if method == "auto" {
            let largest = data
                .group_indices(&["PANEL", "group"])
                .iter()
                .map(Vec::len)
                .max()
                .unwrap_or(0);
            let chosen = if largest < AUTO_LM_ROWS { "loess" } else { "lm" };
            tracing::info!(method = chosen, "stat_smooth using method = \"{chosen}\"");
            params.set("method", chosen);
        }
        Ok(params)
    }

    fn compute_group(&self, data: &DataFrame, scales: PanelScales<'_>, params: &Params) -> Result<DataFrame> {
        if data.is_empty() {
            return Ok(DataFrame::new());
        }
        let x = numeric(data, "x", self.name())?;
        let y = numeric(data, "y", self.name())?;
        let mut obs: Vec<(f64, f64, f64)> = x
            .iter()
            .zip(y.iter())
            .zip(weights(data))
            .filter(|((xi, yi), _)| xi.is_finite() && yi.is_finite())
            .map(|((xi, yi), wi)| (*xi, *yi, wi))
            .collect();
        obs.sort_by(|a, b| a.0.total_cmp(&b.0));
        let distinct = obs.windows(2).filter(|w| w[0].0 != w[1].0).count() + 1;
        if obs.is_empty() || distinct < 2 {
            return Ok(DataFrame::new());
        }

        let data_range = (obs[0].0, obs[obs.len() - 1].0);
        let range = if params.bool("fullrange").unwrap_or(false) {
            scales.x.and_then(|s| s.continuous_limits()).unwrap_or(data_range)
        } else {
            data_range
        };
        let n = params.usize("n").unwrap_or(80).max(2);
        let step = (range.1 - range.0) / (n - 1) as f64;
        let xseq: Vec<f64> = (0..n).map(|i| range.0 + i as f64 * step).collect();

        let fit = match params.str("method") {
            Some("lm") => fit_lm(&obs, &xseq),
            _ => fit_loess(&obs, &xseq, params.f64("span").unwrap_or(2.0 / 3.0)),
        };
        let mut columns = vec![("x", xseq), ("y", fit.y.clone())];
        if params.bool("se").unwrap_or(true) {
            let z = normal_quantile(0.5 + params.f64("level").unwrap_or(0.95) / 2.0);
            columns.push(("ymin", fit.y.iter().zip(&fit.se).map(|(y, s)| y - z * s).collect()));
            columns.push(("ymax", fit.y.iter().zip(&fit.se).map(|(y, s)| y + z * s).collect()));
            columns.push(("se", fit.se));
        }
        frame(columns)
    }
}

struct Fit {
    y: Vec<f64>,
    se: Vec<f64>,
}

/// Weighted least-squares line with the standard error of the mean.
fn fit_lm(obs: &[(f64, f64, f64)], xseq: &[f64]) -> Fit {
    let sw: f64 = obs.iter().map(|o| o.2).sum();
    let xbar = obs.iter().map(|o| o.2 * o.0).sum::<f64>() / sw;
    let ybar = obs.iter().map(|o| o.2 * o.1).sum::<f64>() / sw;
    let sxx: f64 = obs.iter().map(|o| o.2 * (o.0 - xbar).powi(2)).sum();
    let sxy: f64 = obs.iter().map(|o| o.2 * (o.0 - xbar) * (o.1 - ybar)).sum();
    let slope = sxy / sxx;
    let intercept = ybar - slope * xbar;
    let rss: f64 = obs
        .iter()
        .map(|o| o.2 * (o.1 - intercept - slope * o.0).powi(2))
        .sum();
    let df = obs.len().saturating_sub(2).max(1) as f64;
    let sigma = (rss / df).sqrt();
    Fit {
        y: xseq.iter().map(|x| intercept + slope * x).collect(),
        se: xseq
            .iter()
            .map(|x| sigma * (1.0 / sw + (x - xbar).powi(2) / sxx).sqrt())
            .collect(),
    }
}

/// Operator row of a local linear fit at `x0`: the fitted value is
/// `sum(l_i * y_i)`.
fn loess_weights(obs: &[(f64, f64, f64)], x0: f64, span: f64) -> Vec<f64> {
    let n = obs.len();
    let q = ((span * n as f64).ceil() as usize).clamp(2, n);
    let mut dist: Vec<f64> = obs.iter().map(|o| (o.0 - x0).abs()).collect();
    dist.sort_by(f64::total_cmp);
    let mut h = dist[q - 1];
    if span > 1.0 {
        h *= span;
    }
    if h <= 0.0 {
        h = f64::EPSILON;
    }
    let w: Vec<f64> = obs
        .iter()
        .map(|o| {
            let u = ((o.0 - x0).abs() / h).min(1.0);
            o.2 * (1.0 - u.powi(3)).powi(3)
        })
        .collect();
    let s0: f64 = w.iter().sum();
    let s1: f64 = w.iter().zip(obs).map(|(wi, o)| wi * (o.0 - x0)).sum();
    let s2: f64 = w.iter().zip(obs).map(|(wi, o)| wi * (o.0 - x0).powi(2)).sum();
    let det = s0 * s2 - s1 * s1;
    if det.abs() <= f64::EPSILON * s0 * s2.max(1.0) {
        return w.iter().map(|wi| wi / s0).collect();
    }
    w.iter()
        .zip(obs)
        .map(|(wi, o)| wi * (s2 - (o.0 - x0) * s1) / det)
        .collect()
}

/// Local linear regression.
fn fit_loess(obs: &[(f64, f64, f64)], xseq: &[f64], span: f64) -> Fit {
    let predict = |l: &[f64]| l.iter().zip(obs).map(|(li, o)| li * o.1).sum::<f64>();

    let mut rss = 0.0;
    let mut trace = 0.0;
    for (i, o) in obs.iter().enumerate() {
        let l = loess_weights(obs, o.0, span);
        trace += l[i];
        rss += o.2 * (o.1 - predict(&l)).powi(2);
    }
    let df = (obs.len() as f64 - trace).max(1.0);
    let sigma = (rss / df).sqrt();

    let (y, se) = xseq
        .iter()
        .map(|x0| {
            let l = loess_weights(obs, *x0, span);
            (predict(&l), sigma * l.iter().map(|v| v * v).sum::<f64>().sqrt())
        })
        .unzip();
    Fit { y, se }
}

/// Inverse of the standard normal distribution function.
///
/// Rational approximation with relative error below 1.2e-9.
pub(crate) fn normal_quantile(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969_683_028_665_376e1,
        2.209_460_984_245_205e2,
        -2.759_285_104_469_687e2,
        1.383_577_518_672_69e2,
        -3.066_479_806_614_716e1,
        2.506_628_277_459_239,
    ];
    const B: [f64; 5] = [
        -5.447_609_879_822_406e1,
        1.615_858_368_580_409e2,
        -1.556_989_798_598_866e2,
        6.680_131_188_771_972e1,
        -1.328_068_155_288_572e1,
    ];
    const C: [f64; 6] = [
        -7.784_894_002_430_293e-3,
        -3.223_964_580_411_365e-1,
        -2.400_758_277_161_838,
        -2.549_732_539_343_734,
        4.374_664_141_464_968,
        2.938_163_982_698_783,
    ];
    const D: [f64; 4] = [
        7.784_695_709_041_462e-3,
        3.224_671_290_700_398e-1,
        2.445_134_137_142_996,
        3.754_408_661_907_416,
    ];
    const LOW: f64 = 0.024_25;

    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }
    let tail = |q: f64| {
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    };
    if p < LOW {
        tail((-2.0 * p.ln()).sqrt())
    } else if p > 1.0 - LOW {
        -tail((-2.0 * (1.0 - p).ln()).sqrt())
    } else {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn xy(x: Vec<f64>, y: Vec<f64>) -> DataFrame {
        DataFrame::new()
            .with_column("x", x)
            .unwrap()
            .with_column("y", y)
            .unwrap()
    }

    fn smooth(df: &DataFrame, params: Params) -> DataFrame {
        let params = params.or_defaults(&SmoothStat.default_params());
        let params = SmoothStat.setup_params(df, params).unwrap();
        SmoothStat
            .compute_group(df, PanelScales::default(), &params)
            .unwrap()
    }

    #[test]
    fn test_lm_recovers_line() {
        let x: Vec<f64> = (0..20).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v + 1.0).collect();
        let out = smooth(&xy(x, y), Params::new().with("method", "lm").with("n", 5.0));
        assert_eq!(out.nrow(), 5);
        let fitted = out.numbers("y").unwrap();
        assert_relative_eq!(fitted[0], 1.0, epsilon = 1e-9);
        assert_relative_eq!(fitted[4], 39.0, epsilon = 1e-9);
        assert!(out.numbers("se").unwrap().iter().all(|s| s.abs() < 1e-6));
    }

    #[test]
    fn test_lm_band_is_narrowest_at_mean() {
        let x: Vec<f64> = (0..30).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|v| v + if (*v as i64) % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let out = smooth(&xy(x, y), Params::new().with("method", "lm").with("n", 3.0));
        let se = out.numbers("se").unwrap();
        assert!(se[1] < se[0] && se[1] < se[2]);
        let (lo, hi) = (out.numbers("ymin").unwrap(), out.numbers("ymax").unwrap());
        assert!(lo.iter().zip(hi).all(|(a, b)| a < b));
    }

    #[test]
    fn test_loess_follows_curve() {
        let x: Vec<f64> = (0..60).map(|i| f64::from(i) / 10.0).collect();
        let y: Vec<f64> = x.iter().map(|v| v.sin()).collect();
        let out = smooth(&xy(x, y), Params::new().with("span", 0.2).with("se", false));
        assert!(!out.has_column("se"));
        for (xi, yi) in out.numbers("x").unwrap().iter().zip(out.numbers("y").unwrap()) {
            assert!((yi - xi.sin()).abs() < 0.1, "{xi}: {yi}");
        }
    }

    #[test]
    fn test_single_x_gives_nothing() {
        let out = smooth(&xy(vec![1.0, 1.0], vec![1.0, 2.0]), Params::new());
        assert!(out.is_empty());
    }

    #[test]
    fn test_auto_method() {
        let df = xy(vec![1.0, 2.0], vec![1.0, 2.0]);
        let params = SmoothStat.setup_params(&df, SmoothStat.default_params()).unwrap();
        assert_eq!(params.str("method"), Some("loess"));
        let bad = Params::new().with("method", "gam");
        assert!(SmoothStat.setup_params(&df, bad).is_err());
    }

    #[test]
    fn test_normal_quantile() {
        assert_relative_eq!(normal_quantile(0.975), 1.959_963_985, epsilon = 1e-6);
        assert_relative_eq!(normal_quantile(0.5), 0.0, epsilon = 1e-12);
        assert_relative_eq!(normal_quantile(0.01), -2.326_347_874, epsilon = 1e-6);
    }
}
