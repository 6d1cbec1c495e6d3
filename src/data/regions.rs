//! Thai Ministry of Public Health regions, by province.
//!
//! Used when a station has a province but no stored region.

const HEALTH_REGIONS: [(&str, &[&str]); 13] = [
    (
        "เขตสุขภาพที่ 1",
        &["เชียงราย", "น่าน", "พะเยา", "แพร่", "เชียงใหม่", "แม่ฮ่องสอน", "ลำปาง", "ลำพูน"],
    ),
    (
        "เขตสุขภาพที่ 2",
        &["ตาก", "พิษณุโลก", "เพชรบูรณ์", "สุโขทัย", "อุตรดิตถ์"],
    ),
    (
        "เขตสุขภาพที่ 3",
        &["ชัยนาท", "กำแพงเพชร", "พิจิตร", "นครสวรรค์", "อุทัยธานี"],
    ),
    (
        "เขตสุขภาพที่ 4",
        &[
            "นนทบุรี",
            "ปทุมธานี",
            "พระนครศรีอยุธยา",
            "สระบุรี",
            "ลพบุรี",
            "สิงห์บุรี",
            "อ่างทอง",
            "นครนายก",
        ],
    ),
    (
        "เขตสุขภาพที่ 5",
        &[
            "กาญจนบุรี",
            "นครปฐม",
            "ราชบุรี",
            "สุพรรณบุรี",
            "ประจวบคีรีขันธ์",
            "เพชรบุรี",
            "สมุทรสงคราม",
            "สมุทรสาคร",
        ],
    ),
    (
        "เขตสุขภาพที่ 6",
        &[
            "ฉะเชิงเทรา",
            "ปราจีนบุรี",
            "สระแก้ว",
            "สมุทรปราการ",
            "จันทบุรี",
            "ชลบุรี",
            "ตราด",
            "ระยอง",
        ],
    ),
    (
        "เขตสุขภาพที่ 7",
        &["กาฬสินธุ์", "ขอนแก่น", "มหาสารคาม", "ร้อยเอ็ด"],
    ),
    (
        "เขตสุขภาพที่ 8",
        &["บึงกาฬ", "เลย", "หนองคาย", "หนองบัวลำภู", "อุดรธานี", "นครพนม", "สกลนคร"],
    ),
    (
        "เขตสุขภาพที่ 9",
        &["ชัยภูมิ", "นครราชสีมา", "บุรีรัมย์", "สุรินทร์"],
    ),
    (
        "เขตสุขภาพที่ 10",
        &["มุกดาหาร", "ยโสธร", "ศรีสะเกษ", "อุบลราชธานี", "อำนาจเจริญ"],
    ),
    (
        "เขตสุขภาพที่ 11",
        &["ชุมพร", "นครศรีธรรมราช", "สุราษฎร์ธานี", "กระบี่", "พังงา", "ภูเก็ต", "ระนอง"],
    ),
    (
        "เขตสุขภาพที่ 12",
        &["พัทลุง", "ตรัง", "นราธิวาส", "ปัตตานี", "ยะลา", "สงขลา", "สตูล"],
    ),
    ("เขตสุขภาพที่ 13", &["กรุงเทพมหานคร", "Bangkok"]),
];

/// Health region for a province name, if it is a known province.
pub fn health_region(province: &str) -> Option<&'static str> {
    let province = province.trim();
    HEALTH_REGIONS
        .iter()
        .find(|(_, provinces)| provinces.iter().any(|p| *p == province))
        .map(|(region, _)| *region)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_provinces_map_to_their_region() {
        assert_eq!(health_region("ชลบุรี"), Some("เขตสุขภาพที่ 6"));
        assert_eq!(health_region("เชียงใหม่"), Some("เขตสุขภาพที่ 1"));
        assert_eq!(health_region(" Bangkok "), Some("เขตสุขภาพที่ 13"));
    }

    #[test]
    fn unknown_province_has_no_region() {
        assert_eq!(health_region("Unknown"), None);
        assert_eq!(health_region(""), None);
    }

    #[test]
    fn every_province_appears_once() {
        let mut all: Vec<&str> = HEALTH_REGIONS
            .iter()
            .flat_map(|(_, provinces)| provinces.iter().copied())
            .collect();
        let total = all.len();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), total);
    }
}
