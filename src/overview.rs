use crate::models::{CourseStanding, Student, StudentOverview};

/// Rounded mean of the present values, `0` when nothing is present.
pub fn rounded_average<I>(values: I) -> u8
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));

    if count == 0 {
        0
    } else {
        (sum / count as f64).round().clamp(0.0, 100.0) as u8
    }
}

pub fn summarize_student(student: Student, courses: Vec<CourseStanding>) -> StudentOverview {
    let average_progress =
        rounded_average(courses.iter().filter_map(|c| c.progress.map(|p| p.value())));
    let average_attendance =
        rounded_average(courses.iter().filter_map(|c| c.attendance.map(f64::from)));

    StudentOverview {
        student,
        courses,
        average_progress,
        average_attendance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Percent;

    fn standing(course_id: i64, progress: Option<f64>, attendance: Option<u8>) -> CourseStanding {
        CourseStanding {
            course_id,
            course_name: format!("Course {course_id}"),
            progress: progress.map(|p| Percent::new(p).unwrap()),
            attendance,
        }
    }

    fn student() -> Student {
        Student {
            id: 5,
            first_name: "Yael".to_string(),
            last_name: "Mizrahi".to_string(),
            email: "yael@example.edu".to_string(),
            last_access: 0,
            suspended: false,
            deleted: false,
        }
    }

    #[test]
    fn averages_skip_absent_values() {
        let overview = summarize_student(
            student(),
            vec![
                standing(1, Some(40.0), Some(100)),
                standing(2, None, None),
                standing(3, Some(75.0), Some(33)),
            ],
        );

        assert_eq!(overview.average_progress, 58);
        assert_eq!(overview.average_attendance, 67);
        assert_eq!(overview.courses.len(), 3);
    }

    #[test]
    fn nothing_present_averages_to_zero() {
        let overview = summarize_student(student(), vec![standing(1, None, None)]);
        assert_eq!(overview.average_progress, 0);
        assert_eq!(overview.average_attendance, 0);
    }
}
