//! 行政区划（Wilayah）
//!
//! 省 -> 市 -> 区 -> 街道，只读数据

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Province {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct City {
    pub id: i64,
    pub province_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct District {
    pub id: i64,
    pub city_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SubDistrict {
    pub id: i64,
    pub district_id: i64,
    pub name: String,
    #[sqlx(default)]
    pub postal_code: Option<String>,
}

/// 区划节点（路径中的一级）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionNode {
    pub id: i64,
    pub name: String,
}

/// 街道到省份的完整路径
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionPath {
    pub province: RegionNode,
    pub city: RegionNode,
    pub district: RegionNode,
    pub sub_district: RegionNode,
    pub postal_code: Option<String>,
}

/// 四表联查的扁平结果
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RegionPathRow {
    pub province_id: i64,
    pub province_name: String,
    pub city_id: i64,
    pub city_name: String,
    pub district_id: i64,
    pub district_name: String,
    pub sub_district_id: i64,
    pub sub_district_name: String,
    pub postal_code: Option<String>,
}

impl From<RegionPathRow> for RegionPath {
    fn from(row: RegionPathRow) -> Self {
        Self {
            province: RegionNode {
                id: row.province_id,
                name: row.province_name,
            },
            city: RegionNode {
                id: row.city_id,
                name: row.city_name,
            },
            district: RegionNode {
                id: row.district_id,
                name: row.district_name,
            },
            sub_district: RegionNode {
                id: row.sub_district_id,
                name: row.sub_district_name,
            },
            postal_code: row.postal_code,
        }
    }
}

impl RegionPath {
    /// 单行展示文本：Kelurahan, Kecamatan, Kota, Provinsi
    pub fn display(&self) -> String {
        format!(
            "{}, {}, {}, {}",
            self.sub_district.name, self.district.name, self.city.name, self.province.name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_from_row() {
        let path: RegionPath = RegionPathRow {
            province_id: 31,
            province_name: "DKI Jakarta".to_string(),
            city_id: 3171,
            city_name: "Jakarta Selatan".to_string(),
            district_id: 317101,
            district_name: "Tebet".to_string(),
            sub_district_id: 3171011001,
            sub_district_name: "Manggarai".to_string(),
            postal_code: Some("12850".to_string()),
        }
        .into();

        assert_eq!(path.city.id, 3171);
        assert_eq!(path.display(), "Manggarai, Tebet, Jakarta Selatan, DKI Jakarta");

        let json = serde_json::to_value(&path).unwrap();
        assert_eq!(json["subDistrict"]["name"], "Manggarai");
        assert_eq!(json["postalCode"], "12850");
    }
}
