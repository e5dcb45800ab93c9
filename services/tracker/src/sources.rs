//! NOMADS filter requests for GDAS analyses and GEFS ensemble forecasts.

use chrono::NaiveDate;

use crate::config::SourceConfig;

/// Subsets of the GDAS 0.25° analysis the pipelines request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GdasRequest {
    /// Specific humidity at 2 m above ground.
    SurfaceHumidity,
    /// Every variable on the 850 hPa level.
    Level850,
}

impl GdasRequest {
    fn query(&self) -> &'static str {
        match self {
            Self::SurfaceHumidity => "&var_SPFH=on&lev_2_m_above_ground=on",
            Self::Level850 => "&lev_850_mb=on",
        }
    }
}

/// One GDAS analysis file (forecast hour 0) on the filter endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GdasFile {
    pub date: NaiveDate,
    pub cycle: String,
    pub request: GdasRequest,
}

impl GdasFile {
    pub fn new(date: NaiveDate, cycle: impl Into<String>, request: GdasRequest) -> Self {
        Self {
            date,
            cycle: cycle.into(),
            request,
        }
    }

    pub fn url(&self, sources: &SourceConfig) -> String {
        format!(
            "{}?dir=%2Fgdas.{}%2F{}%2Fatmos&file={}{}",
            sources.gdas_filter_url,
            self.date.format("%Y%m%d"),
            self.cycle,
            self.remote_name(),
            self.request.query()
        )
    }

    fn remote_name(&self) -> String {
        format!("gdas.t{}z.pgrb2.0p25.f000", self.cycle)
    }

    /// Local file name; the request is part of it so subsets never clash.
    pub fn filename(&self) -> String {
        let suffix = match self.request {
            GdasRequest::SurfaceHumidity => "spfh2m",
            GdasRequest::Level850 => "850mb",
        };
        format!("gdas.{}.t{}z.{}.grib2", self.date.format("%Y%m%d"), self.cycle, suffix)
    }

    /// `YYYYMMDDCC`, used to stamp dated outputs.
    pub fn stamp(&self) -> String {
        format!("{}{}", self.date.format("%Y%m%d"), self.cycle)
    }
}

/// One GEFS 0.5° member file with RH and TMP on 850 hPa.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GefsFile {
    pub date: NaiveDate,
    pub cycle: String,
    pub member: String,
    pub lead_hours: u32,
}

impl GefsFile {
    pub fn new(date: NaiveDate, cycle: impl Into<String>, member: impl Into<String>, lead_hours: u32) -> Self {
        Self {
            date,
            cycle: cycle.into(),
            member: member.into(),
            lead_hours,
        }
    }

    pub fn url(&self, sources: &SourceConfig) -> String {
        format!(
            "{}?dir=%2Fgefs.{}%2F{}%2Fatmos%2Fpgrb2ap5&file={}.t{}z.pgrb2a.0p50.f{:03}\
             &var_RH=on&var_TMP=on&lev_850_mb=on\
             &subregion=&toplat=90&leftlon=-180&rightlon=180&bottomlat=-90",
            sources.gefs_filter_url,
            self.date.format("%Y%m%d"),
            self.cycle,
            self.member,
            self.cycle,
            self.lead_hours
        )
    }

    pub fn filename(&self) -> String {
        format!(
            "gefs.{}.t{}z.{}.f{:03}.grib2",
            self.date.format("%Y%m%d"),
            self.cycle,
            self.member,
            self.lead_hours
        )
    }
}
