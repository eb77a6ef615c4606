use time::OffsetDateTime;

use crate::{
    error::ModelError,
    movies::repo_types::{join_genres, Movie, MovieRow, NewMovie, Runtime},
    store::Store,
    validator::{unique, Validator},
};

const MAX_TITLE_BYTES: usize = 500;
const FIRST_FILM_YEAR: i32 = 1888;
const MAX_GENRES: usize = 5;

pub fn validate_movie(
    v: &mut Validator,
    title: &str,
    year: i32,
    runtime: Runtime,
    genres: &[String],
) {
    v.check(!title.is_empty(), "title", "must be provided");
    v.check(
        title.len() <= MAX_TITLE_BYTES,
        "title",
        "must not be more than 500 bytes long",
    );

    v.check(year != 0, "year", "must be provided");
    v.check(year >= FIRST_FILM_YEAR, "year", "must be greater than 1888");
    v.check(
        year <= OffsetDateTime::now_utc().year(),
        "year",
        "must not be in the future",
    );

    v.check(runtime.0 != 0, "runtime", "must be provided");
    v.check(runtime.0 > 0, "runtime", "must be a positive integer");

    v.check(!genres.is_empty(), "genres", "must contain at least 1 genre");
    v.check(
        genres.len() <= MAX_GENRES,
        "genres",
        "must not contain more than 5 genres",
    );
    v.check(unique(genres), "genres", "must not contain duplicate values");
}

impl NewMovie {
    pub fn validate(&self, v: &mut Validator) {
        validate_movie(v, &self.title, self.year, self.runtime, &self.genres);
    }
}

impl Movie {
    pub fn validate(&self, v: &mut Validator) {
        validate_movie(v, &self.title, self.year, self.runtime, &self.genres);
    }

    /// Stores `new`; id, created_at and version come back from the same statement.
    pub async fn insert(store: &Store, new: NewMovie) -> Result<Movie, ModelError> {
        let (id, created_at, version) = store
            .fetch_one(
                sqlx::query_as::<_, (i64, OffsetDateTime, i32)>(
                    r#"
                    INSERT INTO movies (title, year, runtime, genres)
                    VALUES ($1, $2, $3, $4)
                    RETURNING id, created_at, version
                    "#,
                )
                .bind(&new.title)
                .bind(new.year)
                .bind(new.runtime.0)
                .bind(join_genres(&new.genres)),
            )
            .await?;

        Ok(Movie {
            id,
            created_at,
            title: new.title,
            year: new.year,
            runtime: new.runtime,
            genres: new.genres,
            version,
        })
    }

    pub async fn get(store: &Store, id: i64) -> Result<Movie, ModelError> {
        if id < 1 {
            return Err(ModelError::NotFound);
        }
        let row = store
            .fetch_one(
                sqlx::query_as::<_, MovieRow>(
                    r#"
                    SELECT id, created_at, title, year, runtime, genres, version
                    FROM movies
                    WHERE id = $1
                    "#,
                )
                .bind(id),
            )
            .await?;
        Ok(row.into())
    }

    /// Writes only if the stored version still equals `self.version`. A stale
    /// copy and a deleted row both come back as `EditConflict`.
    pub async fn update(&mut self, store: &Store) -> Result<(), ModelError> {
        let row = store
            .fetch_optional(
                sqlx::query_as::<_, (i32,)>(
                    r#"
                    UPDATE movies
                    SET title = $1, year = $2, runtime = $3, genres = $4,
                        version = version + 1
                    WHERE id = $5 AND version = $6
                    RETURNING version
                    "#,
                )
                .bind(&self.title)
                .bind(self.year)
                .bind(self.runtime.0)
                .bind(join_genres(&self.genres))
                .bind(self.id)
                .bind(self.version),
            )
            .await?;

        let (version,) = row.ok_or(ModelError::EditConflict)?;
        self.version = version;
        Ok(())
    }

    pub async fn delete(store: &Store, id: i64) -> Result<(), ModelError> {
        if id < 1 {
            return Err(ModelError::NotFound);
        }
        let affected = store
            .execute(sqlx::query("DELETE FROM movies WHERE id = $1").bind(id))
            .await?;
        if affected == 0 {
            return Err(ModelError::NotFound);
        }
        Ok(())
    }
}
