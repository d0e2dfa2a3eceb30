//! Parsers for command-line values.

use anyhow::{anyhow, bail, Context};
use clap::ValueEnum;
use quadalign_core::{Crop, FilterType, InterpolationFilter, Point2};

/// Resampling filter names accepted by `--warp-filter` and `--resize-filter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FilterArg {
    Nearest,
    Bilinear,
    Bicubic,
    Lanczos3,
}

impl From<FilterArg> for InterpolationFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::Nearest => InterpolationFilter::Nearest,
            FilterArg::Bilinear => InterpolationFilter::Bilinear,
            FilterArg::Bicubic => InterpolationFilter::Bicubic,
            FilterArg::Lanczos3 => InterpolationFilter::Lanczos3,
        }
    }
}

impl From<FilterArg> for FilterType {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::Nearest => FilterType::Nearest,
            FilterArg::Bilinear => FilterType::Bilinear,
            FilterArg::Bicubic => FilterType::Bicubic,
            FilterArg::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Parse `"x,y x,y ..."` into points. Pairs may also be separated by `;`.
pub fn parse_points(input: &str) -> anyhow::Result<Vec<Point2>> {
    let points = input
        .split(|c: char| c.is_whitespace() || c == ';')
        .filter(|pair| !pair.is_empty())
        .map(parse_point)
        .collect::<anyhow::Result<Vec<_>>>()?;
    if points.is_empty() {
        bail!("no points given");
    }
    Ok(points)
}

fn parse_point(pair: &str) -> anyhow::Result<Point2> {
    let (x, y) = pair
        .split_once(',')
        .ok_or_else(|| anyhow!("expected x,y but got {pair:?}"))?;
    let x: f64 = x.trim().parse().with_context(|| format!("bad x in {pair:?}"))?;
    let y: f64 = y.trim().parse().with_context(|| format!("bad y in {pair:?}"))?;
    if !x.is_finite() || !y.is_finite() {
        bail!("non-finite coordinate in {pair:?}");
    }
    Ok(Point2::new(x, y))
}

/// Parse `"T,R,B,L"` crop margins.
pub fn parse_crop(input: &str) -> anyhow::Result<Crop> {
    let margins = input
        .split(',')
        .map(|m| {
            m.trim()
                .parse::<u32>()
                .with_context(|| format!("bad crop margin {m:?}"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    match margins[..] {
        [top, right, bottom, left] => Ok(Crop::new(top, right, bottom, left)),
        _ => bail!("crop needs 4 margins (T,R,B,L), got {}", margins.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_points() {
        let points = parse_points("100,100 500,100  520.5,600 80,600").unwrap();
        assert_eq!(points.len(), 4);
        assert_eq!(points[2], Point2::new(520.5, 600.0));

        let points = parse_points("1,2;3,4").unwrap();
        assert_eq!(points, vec![Point2::new(1.0, 2.0), Point2::new(3.0, 4.0)]);
    }

    #[test]
    fn test_parse_points_rejects_garbage() {
        assert!(parse_points("").is_err());
        assert!(parse_points("1 2").is_err());
        assert!(parse_points("1,x").is_err());
        assert!(parse_points("inf,0").is_err());
    }

    #[test]
    fn test_parse_crop() {
        assert_eq!(parse_crop("10,20,30,40").unwrap(), Crop::new(10, 20, 30, 40));
        assert_eq!(parse_crop(" 5, 5 ,5,5").unwrap(), Crop::uniform(5));
        assert!(parse_crop("1,2,3").is_err());
        assert!(parse_crop("1,2,3,-4").is_err());
    }

    #[test]
    fn test_filter_names() {
        assert_eq!(
            FilterArg::from_str("lanczos3", true).unwrap(),
            FilterArg::Lanczos3
        );
        assert_eq!(
            InterpolationFilter::from(FilterArg::Bilinear),
            InterpolationFilter::Bilinear
        );
        assert_eq!(FilterType::from(FilterArg::Nearest), FilterType::Nearest);
    }
}
