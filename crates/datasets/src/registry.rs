//! The supported datasets.

use serde::Serialize;

use crate::calibration::{Calibration, Curve};
use crate::error::{DatasetError, Result};

/// Static description of one NEO dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Dataset {
    /// NEO dataset id, also the key into the scraped catalog.
    pub id: &'static str,
    pub label: &'static str,
    /// Colorbar image published alongside the dataset.
    pub legend_image: &'static str,
    pub default_selected: bool,
    pub calibration: Calibration,
}

impl Dataset {
    /// Physical value for a palette index. See [`Calibration::palette_to_value`].
    #[inline]
    pub fn palette_to_value(&self, index: i32) -> Option<f64> {
        self.calibration.palette_to_value(index)
    }
}

// Exponential rates are ln(last / first) / 254.
static DATASETS: [Dataset; 6] = [
    Dataset {
        id: "GPM_3IMERGM",
        label: "Rainfall",
        legend_image: "https://neo.gsfc.nasa.gov/palettes/trmm_rainfall_m.png",
        default_selected: true,
        // 1 .. 2000 mm/month
        calibration: Calibration::new(Curve::Exponential { a: 1.0, b: 0.029924812832842842 }, "mm"),
    },
    Dataset {
        id: "MOP_CO_M",
        label: "Carbon Monoxide",
        legend_image: "https://neo.gsfc.nasa.gov/palettes/mopitt_co.png",
        default_selected: false,
        calibration: Calibration::new(Curve::Linear { range: 300.0, offset: 0.0 }, "ppbv"),
    },
    Dataset {
        id: "AURA_NO2_M",
        label: "Nitrogen Dioxide",
        legend_image: "https://neo.gsfc.nasa.gov/palettes/omi_no2.png",
        default_selected: false,
        calibration: Calibration::new(Curve::Linear { range: 1500.0, offset: 0.0 }, "1e13 molecules/cm^2"),
    },
    Dataset {
        id: "MOD_NDVI_M",
        label: "Vegetation Index",
        legend_image: "https://neo.gsfc.nasa.gov/palettes/modis_ndvi.png",
        default_selected: false,
        calibration: Calibration::new(Curve::Linear { range: 1.0, offset: -0.1 }, "NDVI"),
    },
    Dataset {
        id: "MOD_LSTD_CLIM_M",
        label: "Land Surface Temperature [day]",
        legend_image: "https://neo.gsfc.nasa.gov/palettes/modis_lst.png",
        default_selected: false,
        calibration: Calibration::new(Curve::Linear { range: 70.0, offset: -25.0 }, "°C"),
    },
    Dataset {
        id: "MOD14A1_M_FIRE",
        label: "Active Fires",
        legend_image: "https://neo.gsfc.nasa.gov/palettes/modis_fire_l3.png",
        default_selected: false,
        // 0.1 .. 30 fires per 1000 km^2
        calibration: Calibration::new(Curve::Exponential { a: 0.1, b: 0.022455836514394492 }, "fires/1000km^2"),
    },
];

/// All supported datasets, in display order.
pub fn all_datasets() -> &'static [Dataset] {
    &DATASETS
}

/// Look up a dataset by its NEO id.
pub fn find_dataset(id: &str) -> Result<&'static Dataset> {
    DATASETS
        .iter()
        .find(|d| d.id == id)
        .ok_or_else(|| DatasetError::UnknownDataset(id.to_string()))
}

/// The dataset selected when the user has not picked one.
pub fn default_dataset() -> &'static Dataset {
    DATASETS.iter().find(|d| d.default_selected).unwrap_or(&DATASETS[0])
}
